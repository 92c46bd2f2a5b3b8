use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use adfs_saml_auth::adfs::Adfs;
use adfs_saml_auth::aws::AwsClient;
use adfs_saml_auth::http_client::{self, HttpOptions};
use adfs_saml_auth::login::login;
use adfs_saml_auth::profile::ProfileWriter;
use adfs_saml_auth::settings::Settings;
use adfs_saml_auth::ui::{StdUI, UI};
use adfs_saml_auth::Error;

/// Trade AD FS credentials for temporary AWS keys stored in an AWS CLI profile.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file, read on top of ~/.adfs-saml.toml and ./.adfs-saml.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL that starts IdP-initiated sign-on
    #[arg(long)]
    idp_entry_url: Option<String>,

    /// Domain-qualified user name, e.g. CORP\jdoe
    #[arg(short, long)]
    username: Option<String>,

    /// 0-based index of the role to assume when several are granted
    #[arg(short, long)]
    role_index: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Profile written to the AWS config and credentials files
    #[arg(short, long)]
    profile: Option<String>,

    #[arg(long)]
    output_format: Option<String>,

    /// Skip TLS certificate verification (test identity providers only)
    #[arg(long)]
    insecure: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.idp_entry_url {
            settings.idp_entry_url = Some(url.clone());
        }
        if let Some(region) = &self.region {
            settings.region = region.clone();
        }
        if let Some(profile) = &self.profile {
            settings.profile = profile.clone();
        }
        if let Some(output_format) = &self.output_format {
            settings.output_format = output_format.clone();
        }
        if self.insecure {
            settings.ssl_verification = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let ui = StdUI {};

    match run(&cli, &ui).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ui.error(&format!("{:#}", err));
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: &Cli, ui: &StdUI) -> anyhow::Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    log::debug!("settings: {:?}", settings);

    let idp_entry_url = settings.entry_url()?;
    let profile = ProfileWriter::with_defaults(
        settings.aws_config_file.clone(),
        settings.aws_credentials_file.clone(),
        settings.profile.clone(),
    )?;

    let http_client = http_client::create_http_client_with_redirects(&HttpOptions {
        user_agent: &settings.user_agent,
        ssl_verification: settings.ssl_verification,
        timeout: settings.timeout(),
    })?;
    let adfs = Adfs {
        http_client: &http_client,
        idp_entry_url: &idp_entry_url,
    };
    let aws_client = AwsClient::new(&settings.region, settings.timeout()).await;

    let credentials = ui
        .get_username_and_password(cli.username.as_deref())
        .context("Could not read credentials")?;

    let outcome = login(&adfs, &aws_client, ui, credentials, cli.role_index.as_deref()).await?;

    profile.write_config(&settings.region, &settings.output_format)?;
    profile.write_credentials(&outcome.credentials)?;
    log::info!(
        "stored credentials for {} in profile {}",
        outcome.role.role_arn,
        settings.profile
    );

    ui.success(&settings.profile, &outcome.credentials.expiration);
    Ok(())
}
