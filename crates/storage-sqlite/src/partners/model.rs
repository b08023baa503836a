//! Database models for partners.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use gestima_core::partners::{NewPartner, Partner};

use crate::utils::audit_from_columns;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::partners)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PartnerDB {
    pub id: i64,
    pub partner_number: String,
    pub company_name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_customer: bool,
    pub is_supplier: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<NaiveDateTime>,
    pub deleted_by: Option<String>,
    pub version: i32,
}

impl From<PartnerDB> for Partner {
    fn from(db: PartnerDB) -> Self {
        Partner {
            id: db.id,
            partner_number: db.partner_number,
            company_name: db.company_name,
            ico: db.ico,
            dic: db.dic,
            email: db.email,
            phone: db.phone,
            contact_person: db.contact_person,
            street: db.street,
            city: db.city,
            postal_code: db.postal_code,
            country: db.country,
            is_customer: db.is_customer,
            is_supplier: db.is_supplier,
            notes: db.notes,
            audit: audit_from_columns((
                db.created_at,
                db.updated_at,
                db.created_by,
                db.updated_by,
                db.deleted_at,
                db.deleted_by,
                db.version,
            )),
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::partners)]
pub struct NewPartnerDB {
    pub partner_number: String,
    pub company_name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_customer: bool,
    pub is_supplier: bool,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl From<NewPartner> for NewPartnerDB {
    fn from(new_partner: NewPartner) -> Self {
        let now = Utc::now().naive_utc();
        NewPartnerDB {
            partner_number: new_partner.partner_number,
            company_name: new_partner.company_name,
            ico: new_partner.ico,
            dic: new_partner.dic,
            email: new_partner.email,
            phone: new_partner.phone,
            contact_person: new_partner.contact_person,
            street: new_partner.street,
            city: new_partner.city,
            postal_code: new_partner.postal_code,
            country: new_partner.country,
            is_customer: new_partner.is_customer,
            is_supplier: new_partner.is_supplier,
            notes: new_partner.notes,
            created_at: now,
            updated_at: now,
            created_by: new_partner.created_by.clone(),
            updated_by: new_partner.created_by,
        }
    }
}
