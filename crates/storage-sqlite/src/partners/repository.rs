//! Partner repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::partners::{NewPartner, Partner, PartnerRepositoryTrait};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::partners;
use crate::schema::partners::dsl::*;

use super::model::{NewPartnerDB, PartnerDB};

pub struct PartnerRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl PartnerRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl PartnerRepositoryTrait for PartnerRepository {
    async fn create(&self, new_partner: NewPartner) -> Result<Partner> {
        self.writer
            .exec(move |conn| {
                new_partner.validate()?;
                let db_partner: NewPartnerDB = new_partner.into();
                let inserted: PartnerDB = diesel::insert_into(partners::table)
                    .values(&db_partner)
                    .get_result(conn)
                    .into_core()?;
                Ok(inserted.into())
            })
            .await
    }

    fn get_by_id(&self, partner_id: i64) -> Result<Partner> {
        let mut conn = get_connection(&self.pool)?;
        let partner: PartnerDB = partners
            .filter(id.eq(partner_id))
            .filter(deleted_at.is_null())
            .select(PartnerDB::as_select())
            .first(&mut conn)
            .into_core()?;
        Ok(partner.into())
    }

    fn list_active(&self) -> Result<Vec<Partner>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<PartnerDB> = partners
            .filter(deleted_at.is_null())
            .order(company_name.asc())
            .select(PartnerDB::as_select())
            .load(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
