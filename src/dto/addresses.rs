use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppError, models::Address};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressInput {
    pub provinsi: String,
    pub kabupaten: String,
    pub kecamatan: String,
    pub kelurahan: String,
    #[serde(default)]
    pub detail: String,
    pub kodepos: String,
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("provinsi", &self.provinsi),
            ("kabupaten", &self.kabupaten),
            ("kecamatan", &self.kecamatan),
            ("kelurahan", &self.kelurahan),
            ("kodepos", &self.kodepos),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
        Ok(())
    }

    pub fn into_address(self) -> Address {
        Address {
            id: String::new(),
            provinsi: self.provinsi.trim().to_string(),
            kabupaten: self.kabupaten.trim().to_string(),
            kecamatan: self.kecamatan.trim().to_string(),
            kelurahan: self.kelurahan.trim().to_string(),
            detail: self.detail.trim().to_string(),
            kodepos: self.kodepos.trim().to_string(),
            is_default: false,
        }
    }
}
