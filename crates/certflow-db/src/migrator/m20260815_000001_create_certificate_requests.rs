//! Migration to create the certificate_requests table

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CertificateRequests::Table)
                    .if_not_exists()
                    .col(string_len(CertificateRequests::Id, 255).primary_key())
                    .col(string_len(CertificateRequests::Domain, 255).not_null())
                    .col(string_len(CertificateRequests::DomainKind, 16).not_null())
                    .col(string_len(CertificateRequests::Authority, 16).not_null())
                    .col(string_len(CertificateRequests::OwnerAccountId, 255).not_null())
                    .col(
                        string_len(CertificateRequests::Status, 24)
                            .not_null()
                            .default("pending_verification"),
                    )
                    .col(text(CertificateRequests::VerificationToken).not_null())
                    .col(text_null(CertificateRequests::ChallengeRecordName))
                    .col(text_null(CertificateRequests::ChallengeRecordTarget))
                    .col(text_null(CertificateRequests::IntermediateRecordId))
                    .col(text_null(CertificateRequests::IssuedCertificate))
                    .col(text_null(CertificateRequests::PrivateKey))
                    .col(text_null(CertificateRequests::CaCertificate))
                    .col(text_null(CertificateRequests::LastError))
                    .col(
                        integer(CertificateRequests::RetryCount)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        boolean(CertificateRequests::DnsAutomatable)
                            .not_null()
                            .default(false),
                    )
                    .col(
                        timestamp_with_time_zone(CertificateRequests::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(CertificateRequests::VerifiedAt))
                    .col(timestamp_with_time_zone_null(CertificateRequests::IssuedAt))
                    .to_owned(),
            )
            .await?;

        // Index on domain for the one-active-request-per-domain lookup
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_certificate_requests_domain")
                    .table(CertificateRequests::Table)
                    .col(CertificateRequests::Domain)
                    .to_owned(),
            )
            .await?;

        // Index on status for dashboard filtering
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_certificate_requests_status")
                    .table(CertificateRequests::Table)
                    .col(CertificateRequests::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CertificateRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CertificateRequests {
    #[sea_orm(iden = "certificate_requests")]
    Table,
    Id,
    Domain,
    DomainKind,
    Authority,
    OwnerAccountId,
    Status,
    VerificationToken,
    ChallengeRecordName,
    ChallengeRecordTarget,
    IntermediateRecordId,
    IssuedCertificate,
    PrivateKey,
    CaCertificate,
    LastError,
    RetryCount,
    DnsAutomatable,
    CreatedAt,
    VerifiedAt,
    IssuedAt,
}
