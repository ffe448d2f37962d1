use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type WalletId = Uuid;

/// What kind of money container a wallet is. Purely descriptive: every type
/// behaves the same for balance purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    Cash,
    Bank,
    Card,
    Digital,
    Savings,
}

impl WalletType {
    pub const ALL: [WalletType; 5] = [
        WalletType::Cash,
        WalletType::Bank,
        WalletType::Card,
        WalletType::Digital,
        WalletType::Savings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Cash => "cash",
            WalletType::Bank => "bank",
            WalletType::Card => "card",
            WalletType::Digital => "digital",
            WalletType::Savings => "savings",
        }
    }
}

impl FromStr for WalletType {
    type Err = UnknownWalletType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(WalletType::Cash),
            "bank" => Ok(WalletType::Bank),
            "card" => Ok(WalletType::Card),
            "digital" => Ok(WalletType::Digital),
            "savings" => Ok(WalletType::Savings),
            _ => Err(UnknownWalletType(s.to_string())),
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWalletType(pub String);

impl fmt::Display for UnknownWalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown wallet type '{}' (expected cash, bank, card, digital or savings)",
            self.0
        )
    }
}

impl std::error::Error for UnknownWalletType {}

/// A named money container. Its current balance is never stored here: it is
/// always derived from `initial_balance` and the transactions pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub name: String,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    /// Baseline the derived balance starts from. May be negative.
    pub initial_balance: Cents,
}

impl Wallet {
    pub fn new(name: String, wallet_type: WalletType, initial_balance: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            wallet_type,
            initial_balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_type_roundtrip() {
        for wt in WalletType::ALL {
            let parsed: WalletType = wt.as_str().parse().unwrap();
            assert_eq!(wt, parsed);
        }
    }

    #[test]
    fn test_wallet_type_parse_is_case_insensitive() {
        assert_eq!("Savings".parse::<WalletType>(), Ok(WalletType::Savings));
        assert_eq!(" CARD ".parse::<WalletType>(), Ok(WalletType::Card));
        assert!("asset".parse::<WalletType>().is_err());
    }

    #[test]
    fn test_wallet_type_display_pads() {
        assert_eq!(format!("[{:<8}]", WalletType::Cash), "[cash    ]");
    }

    #[test]
    fn test_new_wallets_get_distinct_ids() {
        let a = Wallet::new("Cash".into(), WalletType::Cash, 0);
        let b = Wallet::new("Cash".into(), WalletType::Cash, 0);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wallet_serializes_type_field() {
        let wallet = Wallet::new("Bank".into(), WalletType::Bank, 150000);
        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["type"], "bank");
        assert_eq!(json["initial_balance"], 150000);
        assert_eq!(json["name"], "Bank");
    }
}
