//! Renders [`ContractParameters`] into a Sui coin module.

use std::path::Path;

use suiforge_core::error::TemplateError;
use suiforge_core::{ContractParameters, RenderedContract};

use crate::engine::{self, Bindings};
use crate::naming::sanitize_module_name;

/// The built-in coin template with `mint`, `burn` and `transfer` sections.
pub const BUILTIN_COIN_TEMPLATE: &str = include_str!("../templates/coin.move.tmpl");

/// Holds one template and renders coin modules from it.
#[derive(Debug, Clone)]
pub struct ContractRenderer {
    template: String,
}

impl Default for ContractRenderer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ContractRenderer {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_COIN_TEMPLATE)
    }

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let template = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "Loaded contract template");
        Ok(Self::new(template))
    }

    /// The template at `path`, or the built-in one when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, TemplateError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self, params: &ContractParameters) -> Result<RenderedContract, TemplateError> {
        if params.name.trim().is_empty() {
            return Err(invalid("name", "must not be empty"));
        }
        if params.symbol.trim().is_empty() {
            return Err(invalid("symbol", "must not be empty"));
        }

        let module_name = match params.module_name.as_deref() {
            Some(explicit) => sanitize_module_name(explicit),
            None => sanitize_module_name(&params.name),
        };
        let witness_name = module_name.to_uppercase();
        let raw_initial_supply = raw_supply(params.initial_supply, params.decimals)?;

        let bindings: Bindings = [
            ("module_name", module_name.clone()),
            ("witness_name", witness_name.clone()),
            ("name", escape_byte_string(&params.name)),
            ("symbol", escape_byte_string(&params.symbol)),
            ("decimals", params.decimals.to_string()),
            ("description", escape_byte_string(&params.description)),
            ("icon_url", escape_byte_string(&params.icon_url)),
            ("initial_supply", params.initial_supply.to_string()),
            ("raw_initial_supply", raw_initial_supply.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let has_icon = !params.icon_url.is_empty();
        let [mint, burn, transfer] = params.capabilities.sections();
        let flags = [
            mint,
            burn,
            transfer,
            ("has_icon", has_icon),
            ("no_icon", !has_icon),
        ];

        let source = engine::render(&self.template, &bindings, &flags)?;
        tracing::debug!(
            module = %module_name,
            mint = params.capabilities.mint,
            burn = params.capabilities.burn,
            transfer = params.capabilities.transfer,
            "Rendered contract"
        );

        Ok(RenderedContract {
            module_name,
            witness_name,
            source,
        })
    }
}

/// Render with the built-in coin template.
pub fn render_contract(params: &ContractParameters) -> Result<RenderedContract, TemplateError> {
    ContractRenderer::builtin().render(params)
}

fn invalid(field: &str, reason: impl Into<String>) -> TemplateError {
    TemplateError::InvalidParameter {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// `supply * 10^decimals`, the amount in base units.
fn raw_supply(supply: u64, decimals: u8) -> Result<u64, TemplateError> {
    10u64
        .checked_pow(u32::from(decimals))
        .and_then(|scale| supply.checked_mul(scale))
        .ok_or_else(|| {
            invalid(
                "initial_supply",
                format!("{supply} with {decimals} decimals overflows u64"),
            )
        })
}

/// Escape text for a Move `b"..."` literal. Non-printable and non-ASCII
/// bytes become `\xHH`.
fn escape_byte_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out
}
