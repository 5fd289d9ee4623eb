use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // providers 表
        manager
            .create_table(
                Table::create()
                    .table(Provider::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Provider::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Provider::Name).string().not_null())
                    .col(ColumnDef::new(Provider::ProviderType).string().not_null())
                    .col(ColumnDef::new(Provider::AccessKey).string().not_null().default(""))
                    .col(ColumnDef::new(Provider::SecretKey).string().not_null())
                    .col(ColumnDef::new(Provider::Region).string().null())
                    .col(ColumnDef::new(Provider::Enabled).boolean().not_null().default(true))
                    .col(ColumnDef::new(Provider::Status).string().not_null().default("unknown"))
                    .col(ColumnDef::new(Provider::LastError).string().null())
                    .col(ColumnDef::new(Provider::LastTestAt).string().null())
                    .col(ColumnDef::new(Provider::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Provider::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // domains 表
        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Domain::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Domain::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Domain::ProviderId).string().not_null())
                    .col(ColumnDef::new(Domain::Status).string().not_null())
                    .col(ColumnDef::new(Domain::LastSyncedAt).string().null())
                    .col(ColumnDef::new(Domain::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Domain::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_domains_provider_id")
                    .table(Domain::Table)
                    .col(Domain::ProviderId)
                    .to_owned(),
            )
            .await?;

        // records 表
        manager
            .create_table(
                Table::create()
                    .table(Record::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Record::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Record::DomainId).string().not_null())
                    .col(ColumnDef::new(Record::Name).string().not_null())
                    .col(ColumnDef::new(Record::RecordType).string().not_null())
                    .col(ColumnDef::new(Record::Value).string().not_null())
                    .col(ColumnDef::new(Record::Ttl).integer().not_null())
                    .col(ColumnDef::new(Record::Priority).integer().null())
                    .col(ColumnDef::new(Record::Enabled).boolean().not_null().default(true))
                    .col(ColumnDef::new(Record::ExternalId).string().null())
                    .col(ColumnDef::new(Record::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Record::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_records_domain_key")
                    .table(Record::Table)
                    .col(Record::DomainId)
                    .col(Record::Name)
                    .col(Record::RecordType)
                    .to_owned(),
            )
            .await?;

        // ddns_configs 表
        manager
            .create_table(
                Table::create()
                    .table(DdnsConfig::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DdnsConfig::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(DdnsConfig::Name).string().not_null())
                    .col(ColumnDef::new(DdnsConfig::DomainId).string().not_null())
                    .col(ColumnDef::new(DdnsConfig::Subdomain).string().not_null())
                    .col(ColumnDef::new(DdnsConfig::RecordType).string().not_null())
                    .col(ColumnDef::new(DdnsConfig::IntervalSecs).big_integer().not_null())
                    .col(ColumnDef::new(DdnsConfig::Mode).string().not_null().default("auto"))
                    .col(ColumnDef::new(DdnsConfig::Enabled).boolean().not_null().default(true))
                    .col(ColumnDef::new(DdnsConfig::LastIp).string().null())
                    .col(ColumnDef::new(DdnsConfig::LastUpdateAt).string().null())
                    .col(ColumnDef::new(DdnsConfig::LastStatus).string().null())
                    .col(ColumnDef::new(DdnsConfig::LastError).string().null())
                    .col(ColumnDef::new(DdnsConfig::CreatedAt).string().not_null())
                    .col(ColumnDef::new(DdnsConfig::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ddns_logs 表 (append-only, `seq` gives insertion order)
        manager
            .create_table(
                Table::create()
                    .table(DdnsLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DdnsLog::Seq)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DdnsLog::Id).string().not_null().unique_key())
                    .col(ColumnDef::new(DdnsLog::ConfigId).string().not_null())
                    .col(ColumnDef::new(DdnsLog::OldIp).string().null())
                    .col(ColumnDef::new(DdnsLog::NewIp).string().null())
                    .col(ColumnDef::new(DdnsLog::Status).string().not_null())
                    .col(ColumnDef::new(DdnsLog::Message).string().not_null())
                    .col(ColumnDef::new(DdnsLog::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ddns_logs_config_id")
                    .table(DdnsLog::Table)
                    .col(DdnsLog::ConfigId)
                    .to_owned(),
            )
            .await?;

        // certificates 表
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Certificate::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Certificate::DomainId).string().not_null())
                    .col(ColumnDef::new(Certificate::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Certificate::Kind).string().not_null())
                    .col(ColumnDef::new(Certificate::Status).string().not_null())
                    .col(ColumnDef::new(Certificate::Issuer).string().null())
                    .col(ColumnDef::new(Certificate::Subject).string().null())
                    .col(ColumnDef::new(Certificate::SerialNumber).string().null())
                    .col(ColumnDef::new(Certificate::NotBefore).string().null())
                    .col(ColumnDef::new(Certificate::NotAfter).string().null())
                    .col(ColumnDef::new(Certificate::AutoRenew).boolean().not_null().default(true))
                    .col(ColumnDef::new(Certificate::RenewalDays).big_integer().not_null())
                    .col(ColumnDef::new(Certificate::LastRenewedAt).string().null())
                    .col(ColumnDef::new(Certificate::LastError).string().null())
                    .col(ColumnDef::new(Certificate::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Certificate::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DdnsLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DdnsConfig::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Record::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Provider::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Provider {
    #[sea_orm(iden = "providers")]
    Table,
    Id,
    Name,
    ProviderType,
    AccessKey,
    SecretKey,
    Region,
    Enabled,
    Status,
    LastError,
    LastTestAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Domain {
    #[sea_orm(iden = "domains")]
    Table,
    Id,
    Name,
    ProviderId,
    Status,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Record {
    #[sea_orm(iden = "records")]
    Table,
    Id,
    DomainId,
    Name,
    RecordType,
    Value,
    Ttl,
    Priority,
    Enabled,
    ExternalId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DdnsConfig {
    #[sea_orm(iden = "ddns_configs")]
    Table,
    Id,
    Name,
    DomainId,
    Subdomain,
    RecordType,
    IntervalSecs,
    Mode,
    Enabled,
    LastIp,
    LastUpdateAt,
    LastStatus,
    LastError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DdnsLog {
    #[sea_orm(iden = "ddns_logs")]
    Table,
    Seq,
    Id,
    ConfigId,
    OldIp,
    NewIp,
    Status,
    Message,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Certificate {
    #[sea_orm(iden = "certificates")]
    Table,
    Id,
    DomainId,
    Name,
    Kind,
    Status,
    Issuer,
    Subject,
    SerialNumber,
    NotBefore,
    NotAfter,
    AutoRenew,
    RenewalDays,
    LastRenewedAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}
