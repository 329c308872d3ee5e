use snafu::Snafu;

use crate::filesystem::RemoteObject;

/// Request for a new remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewObject {
    pub name: String,
    pub mime_type: String,
    pub parent_id: String,
    pub content: Option<String>,
}

/// Primitive operations of a remote object store, keyed by object id.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Lists every object that is not in the trash.
    async fn list_objects(&self) -> Result<Vec<RemoteObject>, RemoteError>;
    // Creates the object and returns the id the store assigned to it
    async fn create_object(&mut self, object: NewObject) -> Result<String, RemoteError>;
    async fn delete_object(&mut self, id: &str) -> Result<(), RemoteError>;
    async fn fetch_content(&self, id: &str) -> Result<Vec<u8>, RemoteError>;

    /// Id of the drive root, when the store knows it without a listing.
    fn root_id(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RemoteError {
    #[snafu(display("Remote object '{}' does not exist", id))]
    UnknownObject { id: String },
    #[snafu(display("Remote object '{}' has no content", id))]
    NoContent { id: String },
}
