//! SeaORM-backed implementation of the core request store

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use certflow_core::{CertificateRequest, RequestStore, StoreError};

use crate::entities::certificate_request::{self, Status};

/// Durable request storage over any SeaORM backend
pub struct SeaOrmRequestStore {
    db: DatabaseConnection,
}

impl SeaOrmRequestStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: sea_orm::DbErr) -> StoreError {
    StoreError(e.to_string())
}

fn to_active_model(request: &CertificateRequest) -> certificate_request::ActiveModel {
    certificate_request::ActiveModel {
        id: Set(request.id.clone()),
        domain: Set(request.domain.clone()),
        domain_kind: Set(request.domain_type.into()),
        authority: Set(request.provider.into()),
        owner_account_id: Set(request.owner_account_id.clone()),
        status: Set(request.status.into()),
        verification_token: Set(request.verification_token.clone()),
        challenge_record_name: Set(request.challenge_record_name.clone()),
        challenge_record_target: Set(request.challenge_record_target.clone()),
        intermediate_record_id: Set(request.intermediate_record_id.clone()),
        issued_certificate: Set(request.issued_certificate.clone()),
        private_key: Set(request.private_key.clone()),
        ca_certificate: Set(request.ca_certificate.clone()),
        last_error: Set(request.last_error.clone()),
        retry_count: Set(request.retry_count as i32),
        dns_automatable: Set(request.dns_automatable),
        created_at: Set(request.created_at),
        verified_at: Set(request.verified_at),
        issued_at: Set(request.issued_at),
    }
}

fn from_model(model: certificate_request::Model) -> CertificateRequest {
    CertificateRequest {
        id: model.id,
        domain: model.domain,
        domain_type: model.domain_kind.into(),
        provider: model.authority.into(),
        owner_account_id: model.owner_account_id,
        status: model.status.into(),
        verification_token: model.verification_token,
        challenge_record_name: model.challenge_record_name,
        challenge_record_target: model.challenge_record_target,
        intermediate_record_id: model.intermediate_record_id,
        issued_certificate: model.issued_certificate,
        private_key: model.private_key,
        ca_certificate: model.ca_certificate,
        last_error: model.last_error,
        retry_count: model.retry_count.max(0) as u32,
        dns_automatable: model.dns_automatable,
        created_at: model.created_at,
        verified_at: model.verified_at,
        issued_at: model.issued_at,
    }
}

#[async_trait]
impl RequestStore for SeaOrmRequestStore {
    async fn insert(&self, request: &CertificateRequest) -> Result<(), StoreError> {
        to_active_model(request)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update(&self, request: &CertificateRequest) -> Result<(), StoreError> {
        to_active_model(request)
            .update(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CertificateRequest>, StoreError> {
        Ok(certificate_request::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(from_model))
    }

    async fn find_active_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<CertificateRequest>, StoreError> {
        Ok(certificate_request::Entity::find()
            .filter(certificate_request::Column::Domain.eq(domain))
            .filter(certificate_request::Column::Status.is_not_in([
                Status::Failed,
                Status::Expired,
                Status::Revoked,
            ]))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(from_model))
    }

    async fn list(&self) -> Result<Vec<CertificateRequest>, StoreError> {
        Ok(certificate_request::Entity::find()
            .order_by_desc(certificate_request::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(from_model)
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        certificate_request::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
