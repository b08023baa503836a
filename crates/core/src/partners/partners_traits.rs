//! Partner repository trait.

use async_trait::async_trait;

use super::partners_model::{NewPartner, Partner};
use crate::errors::Result;

#[async_trait]
pub trait PartnerRepositoryTrait: Send + Sync {
    async fn create(&self, new_partner: NewPartner) -> Result<Partner>;

    fn get_by_id(&self, id: i64) -> Result<Partner>;

    fn list_active(&self) -> Result<Vec<Partner>>;
}
