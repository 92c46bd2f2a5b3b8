use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};

use crate::aws::AwsRole;
use crate::identity_provider::Credentials;

pub trait UI {
    /// Prompts for whatever part of the credentials was not supplied.
    fn get_username_and_password(&self, username: Option<&str>) -> io::Result<Credentials>;
    /// Lists `roles` and returns the raw selection as typed.
    fn get_aws_role(&self, roles: &[AwsRole]) -> String;
    fn error(&self, message: &str);
    fn success(&self, profile: &str, expiration: &DateTime<Utc>);
}

pub struct StdUI {}

impl UI for StdUI {
    fn get_username_and_password(&self, username: Option<&str>) -> io::Result<Credentials> {
        let username = match username {
            Some(username) => username.to_string(),
            None => read_from_stdin("Username (domain\\username)")?,
        };
        let password = read_password_from_stdin("Password")?;
        Ok(Credentials::new(username, password))
    }

    fn get_aws_role(&self, roles: &[AwsRole]) -> String {
        println!();
        println!("Please choose the role you would like to assume:");
        for (i, role) in roles.iter().enumerate() {
            println!("[ {} ]: {}", i, role.role_arn);
        }
        read_from_stdin("Selection").unwrap_or_default()
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn success(&self, profile: &str, expiration: &DateTime<Utc>) {
        let rule = "-".repeat(92);
        println!();
        println!("{}", rule);
        println!(
            "Your new access key pair has been stored in your AWS configuration files under the {} profile.",
            profile
        );
        println!("Note that it will expire at {}.", expiration.to_rfc3339());
        println!("After this time you may safely rerun this command to refresh your access key pair.");
        println!("To use this credential call the AWS CLI with the --profile option");
        println!("(e.g. aws --profile {} ec2 describe-instances).", profile);
        println!("{}", rule);
    }
}

pub fn read_from_stdin(prompt: &str) -> io::Result<String> {
    let stdin = io::stdin();
    let mut text = String::new();
    while text.trim().is_empty() {
        print!("{}: ", prompt);
        io::stdout().flush()?;
        text.clear();
        if stdin.lock().read_line(&mut text)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no input for {}", prompt),
            ));
        }
    }
    Ok(text.trim().to_string())
}

pub fn read_password_from_stdin(prompt: &str) -> io::Result<String> {
    loop {
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let pass = rpassword::read_password()?;

        if pass.is_empty() {
            continue;
        }
        return Ok(pass);
    }
}
