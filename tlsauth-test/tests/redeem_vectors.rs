use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use tlsauth_core::canonical::canonicalize;
use tlsauth_core::{CodecError, Error, ManualClock, Signer, VerifiedToken, VerifyError, envelope};
use tlsauth_rsa::{KeyStore, PublicKey, TokenAuthority};
use tlsauth_test::{Bool, OTHER_PUBLIC_PEM, PUBLIC_PEM, TestFile, key_store, read_test};

fn main() {
    let args = Arguments::from_args();

    let mut tests = vec![];
    RedeemTest::add_tests("redeem", &mut tests);

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct RedeemTest {
    token: String,
    key: KeyName,
    digest: String,
    now: i64,
    #[serde(flatten)]
    result: TestResult,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum KeyName {
    Default,
    Other,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TestResult {
    #[serde(rename_all = "kebab-case")]
    Success {
        #[allow(dead_code)]
        expect_fail: Bool<false>,
        data: String,
        issued_at: i64,
        expire_after: u64,
    },
    #[serde(rename_all = "kebab-case")]
    Failure {
        #[allow(dead_code)]
        expect_fail: Bool<true>,
        error: String,
    },
}

impl RedeemTest {
    fn add_tests(name: &str, tests: &mut Vec<Trial>) {
        let test_file: TestFile<Self> = read_test(&format!("{name}.json"));
        for test in test_file.tests {
            let name = format!("{name}::{}", test.name);
            tests.push(Trial::test(name, move || test.test_data.test()));
        }
    }

    fn test(self) -> Result<(), Failed> {
        let public_key = match self.key {
            KeyName::Default => PublicKey::from_pem(PUBLIC_PEM)?,
            KeyName::Other => PublicKey::from_pem(OTHER_PUBLIC_PEM)?,
        };
        let keys = KeyStore::new(&self.digest)?.with_public_key(public_key);
        let authority = TokenAuthority::new(keys).with_clock(ManualClock::new(self.now));

        match self.result {
            TestResult::Success {
                data,
                issued_at,
                expire_after,
                ..
            } => {
                let verified = authority.redeem(&self.token)?;
                assert_eq!(
                    verified,
                    VerifiedToken {
                        data: data.clone(),
                        issued_at,
                        expire_after,
                    }
                );

                // signatures are deterministic, so signing the same fields must reproduce it
                let signature = key_store(&self.digest).sign(&canonicalize(
                    &data,
                    expire_after,
                    issued_at,
                ))?;
                let carried = envelope::decode(&self.token)?.signature()?;
                if carried != signature {
                    return Err(format!(
                        "signature mismatch: token carries {}, expected {}",
                        hex::encode(carried),
                        hex::encode(signature)
                    )
                    .into());
                }

                Ok(())
            }
            TestResult::Failure { error, .. } => match authority.redeem(&self.token) {
                Ok(verified) => Err(format!("redeeming should fail, got {verified:?}").into()),
                Err(err) if kind(&err) == error => Ok(()),
                Err(err) => Err(format!("expected {error}, got {err:?}").into()),
            },
        }
    }
}

fn kind(err: &Error) -> String {
    match err {
        Error::Codec(CodecError::DecodeFailure) => "decode-failure".to_owned(),
        Error::Codec(CodecError::DecompressFailure(_)) => "decompress-failure".to_owned(),
        Error::Codec(CodecError::ParseFailure(_)) => "parse-failure".to_owned(),
        Error::Codec(CodecError::MissingField(field)) => format!("missing-field:{field}"),
        Error::Verify(VerifyError::InvalidSignature) => "invalid-signature".to_owned(),
        Error::Verify(VerifyError::ProviderFailure(_)) => "provider-failure".to_owned(),
        Error::Expired { .. } => "expired".to_owned(),
        other => format!("{other:?}"),
    }
}
