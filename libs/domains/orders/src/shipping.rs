//! Shipping options and simulated carrier shipments

use chrono::{DateTime, Duration, Utc};
use core_config::{ConfigError, FromEnv, env_optional, env_parse};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::codes::{base36, random_base36};
use crate::models::ShippingType;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ShippingOption {
    #[serde(rename = "type")]
    pub shipping_type: ShippingType,
    pub name: String,
    pub description: String,
    /// Business days until delivery; 0 for same-day pickup
    pub estimated_days: i64,
    #[schema(value_type = String, example = "5000")]
    pub price: Decimal,
    pub enabled: bool,
}

/// A registered shipment
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    pub tracking_number: String,
    pub estimated_delivery: DateTime<Utc>,
}

struct Carrier {
    shipping_type: ShippingType,
    env_key: &'static str,
    name: &'static str,
    description: &'static str,
    days: i64,
    default_price: u32,
    tracking_prefix: &'static str,
}

const CARRIERS: [Carrier; 4] = [
    Carrier {
        shipping_type: ShippingType::Chilexpress,
        env_key: "CHILEXPRESS",
        name: "Chilexpress",
        description: "Envío rápido y seguro a todo Chile",
        days: 2,
        default_price: 5000,
        tracking_prefix: "CLX",
    },
    Carrier {
        shipping_type: ShippingType::CorreosChile,
        env_key: "CORREOS_CHILE",
        name: "Correos de Chile",
        description: "Envío económico por correo postal",
        days: 5,
        default_price: 3000,
        tracking_prefix: "CCL",
    },
    Carrier {
        shipping_type: ShippingType::Starken,
        env_key: "STARKEN",
        name: "Starken",
        description: "Envío confiable a todo el país",
        days: 3,
        default_price: 4500,
        tracking_prefix: "STK",
    },
    Carrier {
        shipping_type: ShippingType::Motocicleta,
        env_key: "MOTOCICLETA",
        name: "Envío en Motocicleta",
        description: "Entrega rápida en Santiago (solo RM)",
        days: 1,
        default_price: 3500,
        tracking_prefix: "MOT",
    },
];

fn carrier(shipping_type: ShippingType) -> Option<&'static Carrier> {
    CARRIERS.iter().find(|c| c.shipping_type == shipping_type)
}

fn store_pickup() -> ShippingOption {
    ShippingOption {
        shipping_type: ShippingType::RetiroTienda,
        name: "Retiro en Tienda".to_string(),
        description: "Retira tu pedido en nuestro local".to_string(),
        estimated_days: 0,
        price: Decimal::ZERO,
        enabled: true,
    }
}

/// Per-carrier prices and switches from `SHIPPING_{TYPE}_PRICE` / `SHIPPING_{TYPE}_ENABLED`
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    pub options: Vec<ShippingOption>,
}

impl FromEnv for ShippingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut options = Vec::with_capacity(CARRIERS.len() + 1);

        for carrier in &CARRIERS {
            let price: u32 = env_parse(
                &format!("SHIPPING_{}_PRICE", carrier.env_key),
                carrier.default_price,
            )?;
            let enabled = env_optional(&format!("SHIPPING_{}_ENABLED", carrier.env_key))
                .is_none_or(|v| v.trim().eq_ignore_ascii_case("true"));

            options.push(ShippingOption {
                shipping_type: carrier.shipping_type,
                name: carrier.name.to_string(),
                description: carrier.description.to_string(),
                estimated_days: carrier.days,
                price: Decimal::from(price),
                enabled,
            });
        }

        options.push(store_pickup());
        Ok(Self { options })
    }
}

impl Default for ShippingConfig {
    /// Every carrier enabled at its list price
    fn default() -> Self {
        let mut options: Vec<ShippingOption> = CARRIERS
            .iter()
            .map(|c| ShippingOption {
                shipping_type: c.shipping_type,
                name: c.name.to_string(),
                description: c.description.to_string(),
                estimated_days: c.days,
                price: Decimal::from(c.default_price),
                enabled: true,
            })
            .collect();
        options.push(store_pickup());
        Self { options }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShippingService {
    config: ShippingConfig,
}

impl ShippingService {
    pub fn new(config: ShippingConfig) -> Self {
        Self { config }
    }

    /// Enabled options in display order
    pub fn available_options(&self) -> Vec<ShippingOption> {
        self.config
            .options
            .iter()
            .filter(|o| o.enabled)
            .cloned()
            .collect()
    }

    /// The option for `shipping_type` if it is enabled
    pub fn option(&self, shipping_type: ShippingType) -> Option<&ShippingOption> {
        self.config
            .options
            .iter()
            .find(|o| o.shipping_type == shipping_type && o.enabled)
    }

    /// Register a shipment with the carrier (simulated)
    pub fn create_shipment(&self, shipping_type: ShippingType, order_number: &str) -> Shipment {
        let now = Utc::now();

        let Some(carrier) = carrier(shipping_type) else {
            return Shipment {
                tracking_number: format!("RETIRO-{}", order_number),
                estimated_delivery: now,
            };
        };

        let days = self
            .config
            .options
            .iter()
            .find(|o| o.shipping_type == shipping_type)
            .map_or(carrier.days, |o| o.estimated_days);

        let tracking_number = format!(
            "{}-{}-{}",
            carrier.tracking_prefix,
            base36(now.timestamp_millis().unsigned_abs().into()),
            random_base36(8)
        )
        .to_uppercase();

        tracing::info!(
            order_number = %order_number,
            tracking_number = %tracking_number,
            carrier = carrier.name,
            "Shipment created"
        );

        Shipment {
            tracking_number,
            estimated_delivery: now + Duration::days(days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPPING_VARS: [&str; 8] = [
        "SHIPPING_CHILEXPRESS_PRICE",
        "SHIPPING_CHILEXPRESS_ENABLED",
        "SHIPPING_CORREOS_CHILE_PRICE",
        "SHIPPING_CORREOS_CHILE_ENABLED",
        "SHIPPING_STARKEN_PRICE",
        "SHIPPING_STARKEN_ENABLED",
        "SHIPPING_MOTOCICLETA_PRICE",
        "SHIPPING_MOTOCICLETA_ENABLED",
    ];

    #[test]
    fn test_defaults_offer_everything() {
        temp_env::with_vars_unset(SHIPPING_VARS, || {
            let config = ShippingConfig::from_env().unwrap();
            let service = ShippingService::new(config);
            let options = service.available_options();

            assert_eq!(options.len(), 5);
            assert_eq!(options[0].shipping_type, ShippingType::Chilexpress);
            assert_eq!(options[0].price, Decimal::from(5000));
            assert_eq!(options[4].price, Decimal::ZERO);
        });
    }

    #[test]
    fn test_env_overrides_price_and_enabled() {
        temp_env::with_vars(
            [
                ("SHIPPING_STARKEN_PRICE", Some("6000")),
                ("SHIPPING_MOTOCICLETA_ENABLED", Some("FALSE")),
            ],
            || {
                let service = ShippingService::new(ShippingConfig::from_env().unwrap());
                assert_eq!(
                    service.option(ShippingType::Starken).map(|o| o.price),
                    Some(Decimal::from(6000))
                );
                assert!(service.option(ShippingType::Motocicleta).is_none());
                assert!(service.option(ShippingType::RetiroTienda).is_some());
            },
        );
    }

    #[test]
    fn test_negative_price_is_rejected() {
        temp_env::with_var("SHIPPING_CHILEXPRESS_PRICE", Some("-1"), || {
            let err = ShippingConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("SHIPPING_CHILEXPRESS_PRICE"));
        });
    }

    #[test]
    fn test_carrier_tracking_number() {
        let service = ShippingService::default();
        let before = Utc::now();
        let shipment = service.create_shipment(ShippingType::Chilexpress, "ORD-2025-0001");

        let parts: Vec<&str> = shipment.tracking_number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CLX");
        assert_eq!(parts[2].len(), 8);
        assert_eq!(shipment.tracking_number, shipment.tracking_number.to_uppercase());
        assert!(shipment.estimated_delivery >= before + Duration::days(2));
    }

    #[test]
    fn test_store_pickup_shipment() {
        let service = ShippingService::default();
        let shipment = service.create_shipment(ShippingType::RetiroTienda, "ORD-2025-0007");
        assert_eq!(shipment.tracking_number, "RETIRO-ORD-2025-0007");
        assert!(shipment.estimated_delivery <= Utc::now());
    }
}
