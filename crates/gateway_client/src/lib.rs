pub mod credentials;
pub mod gateway;
pub mod http;

pub use credentials::{CredentialStorage, FileCredentials, MemoryCredentials, TOKEN_KEY};
pub use gateway::{ApiResponse, BackendGateway, DeleteResponse, LoginRequest, LoginResponse};
pub use http::{HttpGateway, DEFAULT_API_BASE};
