use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Either an amount in base currency or a label shown as is, e.g. "Custom"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TierPrice {
    Fixed(Decimal),
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: String,
    pub name: String,
    pub price: TierPrice,
    pub price_annual: TierPrice,
    pub period: String,
}

impl PricingTier {
    pub fn fixed(id: &str, name: &str, price: Decimal, price_annual: Decimal) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            price: TierPrice::Fixed(price),
            price_annual: TierPrice::Fixed(price_annual),
            period: "month".to_owned(),
        }
    }

    pub fn custom(id: &str, name: &str, label: &str) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            price: TierPrice::Custom(label.to_owned()),
            price_annual: TierPrice::Custom(label.to_owned()),
            period: String::new(),
        }
    }
}

/// Discount of annual billing against twelve monthly payments
pub const ANNUAL_SAVINGS_PERCENT: u32 = 20;

const MONTHS_IN_YEAR: Decimal = dec!(12);

/// Annual total spread over twelve months, rounded to a whole unit
pub fn monthly_equivalent(annual_total: Decimal) -> Decimal {
    (annual_total / MONTHS_IN_YEAR)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Tier with prices ready for display in the session currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedTier {
    pub id: String,
    pub name: String,
    pub price: String,
    pub price_annual: String,
    /// Monthly price when billed annually, `None` for custom tiers
    pub monthly_equivalent: Option<String>,
    /// Set only when annual billing is cheaper than the monthly price
    pub annual_savings_percent: Option<u32>,
    pub period: String,
}

/// Prices are in AED
pub fn default_tiers() -> Vec<PricingTier> {
    vec![
        PricingTier::fixed("free", "Free", dec!(0), dec!(0)),
        PricingTier::fixed("budget", "Budget", dec!(49), dec!(470)),
        PricingTier::fixed("professional", "Professional", dec!(150), dec!(1440)),
        PricingTier::custom("enterprise", "Enterprise", "Custom"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[derive(Deserialize)]
    struct Catalog {
        tiers: Vec<PricingTier>,
    }

    #[test]
    fn tiers_from_toml() {
        let catalog: Catalog = toml::from_str(
            r#"
            [[tiers]]
            id = "budget"
            name = "Budget"
            price = 49
            price_annual = 470.5
            period = "month"

            [[tiers]]
            id = "enterprise"
            name = "Enterprise"
            price = "Custom"
            price_annual = "Custom"
            period = ""
            "#,
        )
        .expect("in test");

        assert_eq!(catalog.tiers[0].price, TierPrice::Fixed(dec!(49)));
        assert_eq!(catalog.tiers[0].price_annual, TierPrice::Fixed(dec!(470.5)));
        assert_eq!(
            catalog.tiers[1],
            PricingTier::custom("enterprise", "Enterprise", "Custom")
        );
    }

    #[rstest]
    #[case(dec!(1440), dec!(120))]
    #[case(dec!(470), dec!(39))]
    #[case(dec!(389), dec!(32))]
    #[case(dec!(30), dec!(3))]
    #[case(dec!(0), dec!(0))]
    fn monthly_equivalent_of_annual_total(
        #[case] annual_total: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(monthly_equivalent(annual_total), expected);
    }

    #[test]
    fn default_catalog() {
        let tiers = default_tiers();

        assert_eq!(tiers.len(), 4);
        assert_eq!(tiers[2].price, TierPrice::Fixed(dec!(150)));
        assert_eq!(tiers[3].price, TierPrice::Custom("Custom".into()));
    }
}
