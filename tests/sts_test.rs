use std::time::Duration;

use adfs_saml_auth::aws::{AwsClient, AwsRole, TokenExchanger};
use adfs_saml_auth::saml::SAMLAssertion;
use adfs_saml_auth::Error;
use chrono::{TimeZone, Utc};
use wiremock::{
    matchers::{body_string_contains, method},
    Mock, MockServer, ResponseTemplate,
};

const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/Admin";
const PRINCIPAL_ARN: &str = "arn:aws:iam::123456789012:saml-provider/ADFS";

const SUCCESS: &str = r#"<AssumeRoleWithSAMLResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <AssumeRoleWithSAMLResult>
    <Audience>https://signin.aws.amazon.com/saml</Audience>
    <AssumedRoleUser>
      <AssumedRoleId>AROAEXAMPLE:jdoe</AssumedRoleId>
      <Arn>arn:aws:sts::123456789012:assumed-role/Admin/jdoe</Arn>
    </AssumedRoleUser>
    <Credentials>
      <AccessKeyId>ASIAEXAMPLE</AccessKeyId>
      <SecretAccessKey>wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY</SecretAccessKey>
      <SessionToken>FwoGZXIvYXdzEXAMPLE</SessionToken>
      <Expiration>2026-10-18T13:00:00Z</Expiration>
    </Credentials>
    <Issuer>http://adfs.corp.example/adfs/services/trust</Issuer>
    <NameQualifier>abc</NameQualifier>
    <Subject>CORP\jdoe</Subject>
    <SubjectType>persistent</SubjectType>
  </AssumeRoleWithSAMLResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</AssumeRoleWithSAMLResponse>"#;

const EXPIRED: &str = r#"<ErrorResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <Error>
    <Type>Sender</Type>
    <Code>ExpiredTokenException</Code>
    <Message>Token must be redeemed within 5 minutes of issuance</Message>
  </Error>
  <RequestId>4a5fdc2e-0000-0000-0000-000000000000</RequestId>
</ErrorResponse>"#;

fn role() -> AwsRole {
    AwsRole::new(ROLE_ARN.to_string(), PRINCIPAL_ARN.to_string())
}

async fn client(server: &MockServer) -> AwsClient {
    AwsClient::with_endpoint("us-east-1", Duration::from_secs(5), Some(&server.uri())).await
}

#[tokio::test]
async fn test_assertion_is_exchanged_for_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("Action=AssumeRoleWithSAML"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/xml")
                .set_body_string(SUCCESS),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let credentials = client(&mock_server)
        .await
        .get_sts_token(&role(), &SAMLAssertion::new("PHNhbWw+"))
        .await
        .unwrap();

    assert_eq!(credentials.access_key_id, "ASIAEXAMPLE");
    assert_eq!(
        credentials.secret_access_key,
        "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY"
    );
    assert_eq!(credentials.session_token, "FwoGZXIvYXdzEXAMPLE");
    assert_eq!(
        credentials.expiration,
        Utc.with_ymd_and_hms(2026, 10, 18, 13, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_rejection_carries_upstream_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("content-type", "text/xml")
                .set_body_string(EXPIRED),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .await
        .get_sts_token(&role(), &SAMLAssertion::new("PHNhbWw+"))
        .await
        .unwrap_err();

    match err {
        Error::Exchange(message) => {
            assert!(message.contains("ExpiredTokenException"), "{}", message);
            assert!(message.contains("redeemed within 5 minutes"), "{}", message);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
