//! Number allocation lookups backed by SQLite.
//!
//! Counts include tombstoned rows on purpose: a soft-deleted entity keeps
//! its number reserved forever.

use diesel::prelude::*;

use gestima_core::errors::Result;
use gestima_core::numbering::{NumberClass, NumberingRepositoryTrait};

use crate::db::{get_connection, DbPool};
use crate::errors::IntoCore;
use crate::schema::{batch_sets, batches, material_items, partners, parts, quotes, work_centers};

pub struct NumberingRepository {
    pool: DbPool,
}

impl NumberingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl NumberingRepositoryTrait for NumberingRepository {
    fn count(&self, class: NumberClass) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = match class {
            NumberClass::Part => parts::table.count().get_result(&mut conn),
            NumberClass::Material => material_items::table.count().get_result(&mut conn),
            NumberClass::Batch => batches::table.count().get_result(&mut conn),
            NumberClass::BatchSet => batch_sets::table.count().get_result(&mut conn),
            NumberClass::Partner => partners::table.count().get_result(&mut conn),
            NumberClass::WorkCenter => work_centers::table.count().get_result(&mut conn),
            NumberClass::Quote => quotes::table.count().get_result(&mut conn),
        };
        count.into_core()
    }

    fn existing_in(&self, class: NumberClass, candidates: &[String]) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let existing = match class {
            NumberClass::Part => parts::table
                .filter(parts::part_number.eq_any(candidates))
                .select(parts::part_number)
                .load::<String>(&mut conn),
            NumberClass::Material => material_items::table
                .filter(material_items::material_number.eq_any(candidates))
                .select(material_items::material_number)
                .load::<String>(&mut conn),
            NumberClass::Batch => batches::table
                .filter(batches::batch_number.eq_any(candidates))
                .select(batches::batch_number)
                .load::<String>(&mut conn),
            NumberClass::BatchSet => batch_sets::table
                .filter(batch_sets::set_number.eq_any(candidates))
                .select(batch_sets::set_number)
                .load::<String>(&mut conn),
            NumberClass::Partner => partners::table
                .filter(partners::partner_number.eq_any(candidates))
                .select(partners::partner_number)
                .load::<String>(&mut conn),
            NumberClass::WorkCenter => work_centers::table
                .filter(work_centers::work_center_number.eq_any(candidates))
                .select(work_centers::work_center_number)
                .load::<String>(&mut conn),
            NumberClass::Quote => quotes::table
                .filter(quotes::quote_number.eq_any(candidates))
                .select(quotes::quote_number)
                .load::<String>(&mut conn),
        };
        existing.into_core()
    }

    fn max_work_center_number(&self) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        work_centers::table
            .select(diesel::dsl::max(work_centers::work_center_number))
            .get_result::<Option<String>>(&mut conn)
            .into_core()
    }
}
