//! S3 object store backed by the AWS SDK
//!
//! The SDK is async; the store owns a current-thread runtime and blocks on
//! each call so the browser stays a single synchronous loop.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument};

use super::{FolderEntry, Listing, ObjectEntry, ObjectStore};
use crate::error::{BrowseError, Result};

/// Region used when neither the flag, the profile nor the environment set one
const FALLBACK_REGION: &str = "us-east-1";

/// Service error codes that mean the credentials themselves are unusable
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidToken",
    "SignatureDoesNotMatch",
    "TokenRefreshRequired",
];

/// Service error codes for a request the policy does not allow
const PERMISSION_ERROR_CODES: &[&str] = &["AccessDenied", "AllAccessDisabled"];

/// What a failed request was about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// `ListBuckets`: a denial means the profile itself is unusable
    Account,
    /// A bucket listing or object fetch: a denial is local to that resource
    Resource,
}

/// S3 store bound to one resolved profile
pub struct S3Store {
    runtime: Runtime,
    client: Client,
    profile: String,
}

impl S3Store {
    /// Resolve `profile` through the standard credential chain
    ///
    /// An empty profile uses the default chain. Credentials are only checked
    /// on the first request, so a bad profile surfaces from
    /// [`ObjectStore::list_bucket_names`].
    pub fn connect(profile: &str, region: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BrowseError::Connectivity(format!("failed to start runtime: {}", e)))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if !profile.is_empty() {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }

        let sdk_config = runtime.block_on(loader.load());
        let sdk_config = if sdk_config.region().is_none() {
            sdk_config
                .into_builder()
                .region(Region::from_static(FALLBACK_REGION))
                .build()
        } else {
            sdk_config
        };

        info!(
            "Connected S3 client (profile={}, region={})",
            if profile.is_empty() { "<default>" } else { profile },
            sdk_config
                .region()
                .map(|r| r.as_ref())
                .unwrap_or(FALLBACK_REGION)
        );

        Ok(Self {
            runtime,
            client: Client::new(&sdk_config),
            profile: profile.to_string(),
        })
    }
}

impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    fn list_bucket_names(&self) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let resp = self
                .client
                .list_buckets()
                .send()
                .await
                .map_err(|e| classify(e, &self.profile, "<buckets>", Scope::Account))?;

            Ok(resp
                .buckets()
                .iter()
                .filter_map(|b| b.name().map(str::to_owned))
                .collect())
        })
    }

    #[instrument(skip(self))]
    fn list_entries(&self, bucket: &str, prefix: &str, delimiter: &str) -> Result<Listing> {
        self.runtime.block_on(async {
            let mut folders = Vec::new();
            let mut files = Vec::new();
            let mut continuation_token: Option<String> = None;
            let mut pages = 0usize;

            loop {
                let mut req = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix);
                if !delimiter.is_empty() {
                    req = req.delimiter(delimiter);
                }
                if let Some(token) = continuation_token.take() {
                    req = req.continuation_token(token);
                }

                let page = req.send().await.map_err(|e| classify(e, &self.profile, bucket, Scope::Resource))?;
                pages += 1;

                for common in page.common_prefixes() {
                    if let Some(p) = common.prefix() {
                        folders.push(FolderEntry::new(p));
                    }
                }

                for object in page.contents() {
                    let Some(key) = object.key() else {
                        continue;
                    };
                    files.push(ObjectEntry {
                        key: key.to_string(),
                        last_modified: object
                            .last_modified()
                            .and_then(to_chrono)
                            .unwrap_or_default(),
                        size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    });
                }

                match page.next_continuation_token() {
                    Some(token) if page.is_truncated().unwrap_or(false) => {
                        continuation_token = Some(token.to_string());
                    }
                    _ => break,
                }
            }

            debug!(
                "Listed s3://{}/{}: {} folders, {} files in {} page(s)",
                bucket,
                prefix,
                folders.len(),
                files.len(),
                pages
            );

            Ok(Listing::new(folders, files, delimiter))
        })
    }

    #[instrument(skip(self))]
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|err| {
                    if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                        BrowseError::NotFound(key.to_string())
                    } else {
                        classify(err, &self.profile, key, Scope::Resource)
                    }
                })?;

            let body = resp
                .body
                .collect()
                .await
                .map_err(|e| BrowseError::Connectivity(format!("reading {}: {}", key, e)))?;

            Ok(body.into_bytes().to_vec())
        })
    }
}

/// Map an SDK failure onto the browser's error taxonomy
///
/// Rejected credentials are fatal for any call. A permission denial is
/// fatal only for the account-level call.
fn classify<E, R>(err: SdkError<E, R>, profile: &str, resource: &str, scope: Scope) -> BrowseError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_owned);
    let message = DisplayErrorContext(&err).to_string();
    let auth = |message: String| BrowseError::Auth {
        profile: profile.to_string(),
        message,
    };

    match code.as_deref() {
        Some(code) if CREDENTIAL_ERROR_CODES.contains(&code) => auth(message),
        Some(code) if PERMISSION_ERROR_CODES.contains(&code) => match scope {
            Scope::Account => auth(message),
            Scope::Resource => BrowseError::Denied(resource.to_string()),
        },
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => {
            BrowseError::NotFound(resource.to_string())
        }
        _ => {
            let before_send = matches!(
                err,
                SdkError::ConstructionFailure(_) | SdkError::DispatchFailure(_)
            );
            if before_send && mentions_credentials(&message) {
                auth(message)
            } else {
                BrowseError::Connectivity(message)
            }
        }
    }
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// Failures before the request is sent mention the credential provider
fn mentions_credentials(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("credential") || lower.contains("profile")
}
