//! Card and PIX terminals installed in the shop.
//!
//! Each terminal stores its daily debit, credit and PIX totals in dedicated
//! register columns. This module maps terminals and methods onto those columns so
//! reports can iterate them instead of naming every field.

use crate::entities::daily_register;
use serde::{Deserialize, Serialize};

/// How a card terminal was paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardMethod {
    /// Debit card
    Debit,
    /// Credit card
    Credit,
    /// Instant PIX transfer
    Pix,
}

impl CardMethod {
    /// Every method, in display order
    pub const ALL: [Self; 3] = [Self::Debit, Self::Credit, Self::Pix];

    /// Label shown in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debit => "Débito",
            Self::Credit => "Crédito",
            Self::Pix => "PIX",
        }
    }

    /// Suffix of the register columns holding this method
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Pix => "pix",
        }
    }
}

/// A payment terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// Mercado Pago machine
    MercadoPago,
    /// First Itaú machine
    Itau1,
    /// Second Itaú machine
    Itau2,
    /// Third Itaú machine
    Itau3,
    /// Valori machine
    Valori,
    /// InfinitePay machine
    InfinitePay,
    /// C6 account, PIX only
    C6,
}

impl Terminal {
    /// Every terminal, in display order
    pub const ALL: [Self; 7] = [
        Self::MercadoPago,
        Self::Itau1,
        Self::Itau2,
        Self::Itau3,
        Self::Valori,
        Self::InfinitePay,
        Self::C6,
    ];

    /// Name of the individual machine
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MercadoPago => "Mercado Pago",
            Self::Itau1 => "Itaú 1",
            Self::Itau2 => "Itaú 2",
            Self::Itau3 => "Itaú 3",
            Self::Valori => "Valori",
            Self::InfinitePay => "InfinitePay",
            Self::C6 => "C6 (PIX CNPJ)",
        }
    }

    /// Prefix of this terminal's register columns, as in `itau2_credit`
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MercadoPago => "mp",
            Self::Itau1 => "itau1",
            Self::Itau2 => "itau2",
            Self::Itau3 => "itau3",
            Self::Valori => "valori",
            Self::InfinitePay => "infinitepay",
            Self::C6 => "c6",
        }
    }

    /// Acquirer that settles this terminal; the three Itaú machines share one.
    #[must_use]
    pub const fn brand(self) -> &'static str {
        match self {
            Self::Itau1 | Self::Itau2 | Self::Itau3 => "Itaú",
            other => other.label(),
        }
    }

    /// Methods this terminal accepts. C6 is a PIX-only account.
    #[must_use]
    pub fn methods(self) -> &'static [CardMethod] {
        match self {
            Self::C6 => &[CardMethod::Pix],
            _ => &CardMethod::ALL,
        }
    }

    /// Amount recorded on `register` for this terminal and method, `None` when
    /// the terminal does not accept the method.
    #[must_use]
    pub const fn amount(self, register: &daily_register::Model, method: CardMethod) -> Option<f64> {
        use CardMethod::{Credit, Debit, Pix};
        let r = register;
        let value = match (self, method) {
            (Self::MercadoPago, Debit) => r.mp_debit,
            (Self::MercadoPago, Credit) => r.mp_credit,
            (Self::MercadoPago, Pix) => r.mp_pix,
            (Self::Itau1, Debit) => r.itau1_debit,
            (Self::Itau1, Credit) => r.itau1_credit,
            (Self::Itau1, Pix) => r.itau1_pix,
            (Self::Itau2, Debit) => r.itau2_debit,
            (Self::Itau2, Credit) => r.itau2_credit,
            (Self::Itau2, Pix) => r.itau2_pix,
            (Self::Itau3, Debit) => r.itau3_debit,
            (Self::Itau3, Credit) => r.itau3_credit,
            (Self::Itau3, Pix) => r.itau3_pix,
            (Self::Valori, Debit) => r.valori_debit,
            (Self::Valori, Credit) => r.valori_credit,
            (Self::Valori, Pix) => r.valori_pix,
            (Self::InfinitePay, Debit) => r.infinitepay_debit,
            (Self::InfinitePay, Credit) => r.infinitepay_credit,
            (Self::InfinitePay, Pix) => r.infinitepay_pix,
            (Self::C6, Pix) => r.c6_pix,
            (Self::C6, Debit | Credit) => return None,
        };
        Some(value)
    }

    /// Sum of every method of this terminal on `register`.
    #[must_use]
    pub fn total(self, register: &daily_register::Model) -> f64 {
        CardMethod::ALL
            .iter()
            .filter_map(|method| self.amount(register, *method))
            .sum()
    }
}

/// Distinct acquirer brands in display order.
#[must_use]
pub fn brands() -> Vec<&'static str> {
    let mut brands: Vec<&'static str> = Vec::new();
    for terminal in Terminal::ALL {
        if !brands.contains(&terminal.brand()) {
            brands.push(terminal.brand());
        }
    }
    brands
}

/// Sum of every terminal and method on `register`.
#[must_use]
pub fn terminals_total(register: &daily_register::Model) -> f64 {
    Terminal::ALL.iter().map(|t| t.total(register)).sum()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::sample_register;

    #[test]
    fn test_c6_is_pix_only() {
        let mut register = sample_register();
        register.c6_pix = 12.0;
        assert_eq!(Terminal::C6.amount(&register, CardMethod::Debit), None);
        assert_eq!(Terminal::C6.amount(&register, CardMethod::Pix), Some(12.0));
        assert_eq!(Terminal::C6.methods(), &[CardMethod::Pix]);
    }

    #[test]
    fn test_itau_terminals_share_a_brand() {
        assert_eq!(Terminal::Itau1.brand(), "Itaú");
        assert_eq!(Terminal::Itau3.brand(), "Itaú");
        assert_eq!(Terminal::Itau2.label(), "Itaú 2");
        assert_eq!(
            brands(),
            vec!["Mercado Pago", "Itaú", "Valori", "InfinitePay", "C6 (PIX CNPJ)"]
        );
    }

    #[test]
    fn test_terminals_total() {
        let mut register = sample_register();
        register.mp_debit = 10.0;
        register.itau2_credit = 20.0;
        register.infinitepay_pix = 5.5;
        register.c6_pix = 4.5;
        assert_eq!(Terminal::MercadoPago.total(&register), 10.0);
        assert_eq!(terminals_total(&register), 40.0);
    }
}
