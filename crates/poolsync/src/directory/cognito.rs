//! AWS Cognito user pool as a [`PageSource`].

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::config::Region;
use aws_sdk_cognitoidentityprovider::config::retry::RetryConfig;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::types::UserType;

use super::PageSource;
use super::error::{DirectoryError, Result};
use super::types::{PageResult, UserRecord};

/// Largest page Cognito's `ListUsers` accepts.
pub const MAX_PAGE_SIZE: i32 = 60;

/// Extract the AWS region from a user pool id (`us-east-1_AbCdEf` -> `us-east-1`).
pub fn region_from_pool_id(pool_id: &str) -> Result<&str> {
    match pool_id.split_once('_') {
        Some((region, id)) if !region.is_empty() && !id.is_empty() => Ok(region),
        _ => Err(DirectoryError::InvalidPoolId(pool_id.to_string())),
    }
}

/// Pages through the users of a Cognito user pool.
#[derive(Clone, Debug)]
pub struct CognitoPageSource {
    client: Client,
    pool_id: String,
    page_size: Option<i32>,
}

impl CognitoPageSource {
    /// Connect to the pool's region using the default AWS credential chain.
    ///
    /// The SDK's own retry layer is disabled so that every failed request is
    /// reported to the import session, which owns the retry policy.
    pub async fn connect(pool_id: &str, page_size: Option<i32>) -> Result<Self> {
        let region = region_from_pool_id(pool_id)?.to_string();

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region))
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        Ok(Self::new(Client::new(&sdk_config), pool_id, page_size))
    }

    /// Wrap an existing client.
    ///
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`; `None` uses the service default.
    pub fn new(client: Client, pool_id: &str, page_size: Option<i32>) -> Self {
        Self {
            client,
            pool_id: pool_id.to_string(),
            page_size: page_size.map(|size| size.clamp(1, MAX_PAGE_SIZE)),
        }
    }

    /// The user pool being read.
    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }
}

#[async_trait]
impl PageSource for CognitoPageSource {
    async fn fetch_page(&self, token: Option<&str>) -> Result<PageResult> {
        tracing::debug!(pool_id = %self.pool_id, has_token = token.is_some(), "Listing users");

        let response = self
            .client
            .list_users()
            .user_pool_id(&self.pool_id)
            .set_pagination_token(token.map(str::to_string))
            .set_limit(self.page_size)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let records = response.users().iter().map(to_user_record).collect();
        Ok(PageResult::new(
            records,
            response.pagination_token().map(str::to_string),
        ))
    }
}

fn to_user_record(user: &UserType) -> UserRecord {
    let mut record = UserRecord {
        username: user.username().map(str::to_string),
        ..UserRecord::default()
    };
    for attribute in user.attributes() {
        if let Some(value) = attribute.value() {
            record
                .attributes
                .insert(attribute.name().to_string(), value.to_string());
        }
    }
    record
}

/// Map an SDK failure to `SourceUnavailable`, keeping the provider error code.
fn map_sdk_error<E, R>(err: SdkError<E, R>) -> DirectoryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            DirectoryError::unavailable(
                inner.code().unwrap_or("ServiceError"),
                inner
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            )
        }
        SdkError::TimeoutError(_) => {
            DirectoryError::unavailable("TimeoutError", DisplayErrorContext(&err).to_string())
        }
        SdkError::DispatchFailure(_) => {
            DirectoryError::unavailable("DispatchFailure", DisplayErrorContext(&err).to_string())
        }
        SdkError::ResponseError(_) => {
            DirectoryError::unavailable("ResponseError", DisplayErrorContext(&err).to_string())
        }
        _ => DirectoryError::unavailable("SdkError", DisplayErrorContext(&err).to_string()),
    }
}
