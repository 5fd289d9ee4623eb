//! `CertificateRepository` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use dnsflow_core::error::{CoreError, CoreResult};
use dnsflow_core::traits::CertificateRepository;
use dnsflow_core::types::{Certificate, CertificateKind, CertificateStatus};

use super::entity::certificate;
use super::{parse_enum, parse_opt_time, parse_time, storage_err, SqliteStore};

impl certificate::Model {
    fn into_certificate(self) -> CoreResult<Certificate> {
        Ok(Certificate {
            kind: parse_enum(&self.kind, "kind", CertificateKind::parse)?,
            status: parse_enum(&self.status, "status", CertificateStatus::parse)?,
            not_before: parse_opt_time(self.not_before.as_deref(), "not_before")?,
            not_after: parse_opt_time(self.not_after.as_deref(), "not_after")?,
            last_renewed_at: parse_opt_time(self.last_renewed_at.as_deref(), "last_renewed_at")?,
            created_at: parse_time(&self.created_at, "created_at")?,
            updated_at: parse_time(&self.updated_at, "updated_at")?,
            id: self.id,
            domain_id: self.domain_id,
            name: self.name,
            issuer: self.issuer,
            subject: self.subject,
            serial_number: self.serial_number,
            auto_renew: self.auto_renew,
            renewal_days: self.renewal_days,
            last_error: self.last_error,
        })
    }
}

fn certificate_to_active_model(c: &Certificate) -> certificate::ActiveModel {
    certificate::ActiveModel {
        id: Set(c.id.clone()),
        domain_id: Set(c.domain_id.clone()),
        name: Set(c.name.clone()),
        kind: Set(c.kind.as_str().to_string()),
        status: Set(c.status.as_str().to_string()),
        issuer: Set(c.issuer.clone()),
        subject: Set(c.subject.clone()),
        serial_number: Set(c.serial_number.clone()),
        not_before: Set(c.not_before.map(|t| t.to_rfc3339())),
        not_after: Set(c.not_after.map(|t| t.to_rfc3339())),
        auto_renew: Set(c.auto_renew),
        renewal_days: Set(c.renewal_days),
        last_renewed_at: Set(c.last_renewed_at.map(|t| t.to_rfc3339())),
        last_error: Set(c.last_error.clone()),
        created_at: Set(c.created_at.to_rfc3339()),
        updated_at: Set(c.updated_at.to_rfc3339()),
    }
}

#[async_trait]
impl CertificateRepository for SqliteStore {
    async fn find_all(&self) -> CoreResult<Vec<Certificate>> {
        let rows = certificate::Entity::find()
            .order_by_asc(certificate::Column::Name)
            .all(&self.db)
            .await
            .map_err(storage_err("query certificates"))?;

        rows.into_iter().map(certificate::Model::into_certificate).collect()
    }

    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Certificate>> {
        let row = certificate::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(storage_err("query certificate"))?;

        row.map(certificate::Model::into_certificate).transpose()
    }

    async fn find_by_name(&self, name: &str) -> CoreResult<Option<Certificate>> {
        let row = certificate::Entity::find()
            .filter(certificate::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(storage_err("query certificate"))?;

        row.map(certificate::Model::into_certificate).transpose()
    }

    async fn save(&self, certificate: &Certificate) -> CoreResult<()> {
        certificate::Entity::insert(certificate_to_active_model(certificate))
            .on_conflict(
                OnConflict::column(certificate::Column::Id)
                    .update_columns([
                        certificate::Column::Status,
                        certificate::Column::Issuer,
                        certificate::Column::Subject,
                        certificate::Column::SerialNumber,
                        certificate::Column::NotBefore,
                        certificate::Column::NotAfter,
                        certificate::Column::AutoRenew,
                        certificate::Column::RenewalDays,
                        certificate::Column::LastRenewedAt,
                        certificate::Column::LastError,
                        certificate::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(storage_err("save certificate"))?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> CoreResult<()> {
        let result = certificate::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(storage_err("delete certificate"))?;

        if result.rows_affected == 0 {
            return Err(CoreError::CertificateNotFound(id.to_string()));
        }
        Ok(())
    }
}
