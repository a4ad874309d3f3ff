use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// A business users can book with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Empresa {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub slogan: Option<String>,
    #[serde(default)]
    pub duracion_turno_min: Option<i32>,
    #[serde(default)]
    pub categoria_id: Option<i64>,
    #[serde(default)]
    pub admin_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categoria {
    pub id: i64,
    pub nombre: String,
}

/// Payload for creating or editing a business from the admin panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmpresaForm {
    pub nombre: String,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub slogan: Option<String>,
    #[serde(default)]
    pub duracion_turno_min: Option<i32>,
    #[serde(default)]
    pub categoria_id: Option<i64>,
    #[serde(default)]
    pub admin_id: Option<i64>,
}

impl EmpresaForm {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.nombre.trim().is_empty() {
            return Err(ApiError::Validation("nombre is required".to_string()));
        }

        if let Some(minutes) = self.duracion_turno_min {
            if minutes <= 0 {
                return Err(ApiError::Validation(format!(
                    "duracion_turno_min must be positive, got {}",
                    minutes
                )));
            }
        }

        Ok(())
    }
}
