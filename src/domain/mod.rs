pub mod chain;
pub mod constants;
pub mod crypto;
pub mod pkcs7;
pub mod request;
pub mod types; // validated value types shared by adapters and config
