use std::fmt;
use std::str::FromStr;

use crate::constants::GCP_UPLOAD_HOST;
use crate::error::UploadError;
use crate::upload::RequestDescriptor;

/// Object storage systems the uploader knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Google Cloud Storage, simple media upload
    Gcp,
}

impl Target {
    pub fn id(&self) -> &'static str {
        match self {
            Target::Gcp => "gcp",
        }
    }

    pub fn host(&self) -> &'static str {
        match self {
            Target::Gcp => GCP_UPLOAD_HOST,
        }
    }

    /// Request target for `object_name` in `bucket`.
    ///
    /// Both names are inserted verbatim; callers must pre-encode them.
    pub fn request_path(&self, bucket: &str, object_name: &str) -> String {
        match self {
            Target::Gcp => format!(
                "/upload/storage/v1/b/{}/o?uploadType=media&name={}",
                bucket, object_name
            ),
        }
    }

    pub fn request(&self, bucket: &str, object_name: &str) -> RequestDescriptor {
        RequestDescriptor::new(
            self.host(),
            &self.request_path(bucket, object_name),
            object_name,
        )
    }
}

impl FromStr for Target {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcp" => Ok(Target::Gcp),
            other => Err(UploadError::Configuration(format!(
                "System (-s) '{}' not recognized",
                other
            ))),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
