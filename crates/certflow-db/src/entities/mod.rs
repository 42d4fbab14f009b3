//! Database entities

pub mod certificate_request;

pub use certificate_request::Entity as CertificateRequest;

pub mod prelude {
    pub use super::certificate_request::Entity as CertificateRequest;
}
