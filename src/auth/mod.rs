pub mod credential;

pub use credential::{CredentialProvider, MemoryCredential, TokenFile};
