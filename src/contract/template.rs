//! Property contract rendering
//!
//! The rendered text is what gets hashed and signed, so the layout below is
//! part of the signature format: field order and spacing must not drift.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Name, address and representation of one side of the sale
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PartyDetails {
    /// Legal name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Representing solicitor
    pub solicitor: String,
}

/// The property being sold
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyDetails {
    /// Property address
    pub address: String,
    /// Free-text description
    pub description: String,
    /// Purchase price in pounds, as written
    pub price: String,
    /// Agreed completion date, as written
    pub completion_date: String,
    /// Contract reference
    pub contract_id: String,
}

/// Everything needed to draw up a property contract
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContractDetails {
    /// Selling party
    pub seller: PartyDetails,
    /// Buying party
    pub buyer: PartyDetails,
    /// Property and price
    pub property: PropertyDetails,
}

impl ContractDetails {
    /// Details with only price and contract id filled in
    pub fn with_price(price: impl Into<String>, contract_id: impl Into<String>) -> Self {
        ContractDetails {
            property: PropertyDetails {
                price: price.into(),
                contract_id: contract_id.into(),
                ..PropertyDetails::default()
            },
            ..ContractDetails::default()
        }
    }
}

/// Renders contract text from structured fields
pub struct ContractManager;

impl ContractManager {
    /// Render a property purchase agreement dated `date`
    ///
    /// Pure: identical inputs always produce identical text.
    pub fn create_property_contract(
        seller: &PartyDetails,
        buyer: &PartyDetails,
        property: &PropertyDetails,
        date: NaiveDate,
    ) -> String {
        format!(
            "PROPERTY PURCHASE AGREEMENT\n\
             \n\
             This agreement is made between:\n\
             \n\
             SELLER:\n\
             Name: {seller_name}\n\
             Address: {seller_address}\n\
             Represented by: {seller_solicitor}\n\
             \n\
             BUYER:\n\
             Name: {buyer_name}\n\
             Address: {buyer_address}\n\
             Represented by: {buyer_solicitor}\n\
             \n\
             PROPERTY DETAILS:\n\
             Address: {property_address}\n\
             Description: {description}\n\
             Purchase Price: \u{a3}{price}\n\
             Completion Date: {completion_date}\n\
             \n\
             TERMS AND CONDITIONS:\n\
             1. The Buyer agrees to purchase the Property for the stated purchase price.\n\
             2. The transaction is subject to satisfactory surveys and searches.\n\
             3. Completion shall take place on the agreed completion date.\n\
             4. This agreement is governed by English Law.\n\
             \n\
             Digital signatures below constitute legal acceptance of these terms.\n\
             \n\
             Contract ID: {contract_id}\n\
             Date: {date}",
            seller_name = seller.name,
            seller_address = seller.address,
            seller_solicitor = seller.solicitor,
            buyer_name = buyer.name,
            buyer_address = buyer.address,
            buyer_solicitor = buyer.solicitor,
            property_address = property.address,
            description = property.description,
            price = property.price,
            completion_date = property.completion_date,
            contract_id = property.contract_id,
            date = date.format("%Y-%m-%d"),
        )
    }

    /// Contract id recorded in rendered contract text
    pub fn contract_id(contract: &str) -> Option<&str> {
        contract
            .lines()
            .find_map(|line| line.strip_prefix("Contract ID: "))
    }

    /// Render from a [`ContractDetails`] bundle
    pub fn render(details: &ContractDetails, date: NaiveDate) -> String {
        Self::create_property_contract(&details.seller, &details.buyer, &details.property, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContractDetails {
        ContractDetails {
            seller: PartyDetails {
                name: "Test Seller".into(),
                address: "Seller Address".into(),
                solicitor: "Seller Solicitor".into(),
            },
            buyer: PartyDetails {
                name: "Test Buyer".into(),
                address: "Buyer Address".into(),
                solicitor: "Buyer Solicitor".into(),
            },
            property: PropertyDetails {
                address: "Property Address".into(),
                description: "Test Property".into(),
                price: "100000".into(),
                completion_date: "2025-12-31".into(),
                contract_id: "TEST-001".into(),
            },
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_contains_fields() {
        let text = ContractManager::render(&sample(), date());

        assert!(text.contains("Name: Test Seller"));
        assert!(text.contains("Name: Test Buyer"));
        assert!(text.contains("Address: Property Address"));
        assert!(text.contains("Purchase Price: £100000"));
        assert!(text.contains("Contract ID: TEST-001"));
        assert!(text.ends_with("Date: 2025-06-01"));
        assert!(text.starts_with("PROPERTY PURCHASE AGREEMENT\n\nThis agreement"));
    }

    #[test]
    fn test_section_order_is_fixed() {
        let text = ContractManager::render(&sample(), date());

        let seller = text.find("SELLER:").unwrap();
        let buyer = text.find("BUYER:").unwrap();
        let property = text.find("PROPERTY DETAILS:").unwrap();
        let terms = text.find("TERMS AND CONDITIONS:").unwrap();
        assert!(seller < buyer && buyer < property && property < terms);
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(
            ContractManager::render(&sample(), date()),
            ContractManager::render(&sample(), date())
        );
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let text = ContractManager::render(&ContractDetails::with_price("500000", "C-1"), date());

        assert!(text.contains("SELLER:\nName: \nAddress: \n"));
        assert!(text.contains("Purchase Price: £500000\n"));
        assert!(text.contains("Contract ID: C-1\n"));
    }

    #[test]
    fn test_contract_id_read_back() {
        let text = ContractManager::render(&sample(), date());
        assert_eq!(ContractManager::contract_id(&text), Some("TEST-001"));
        assert_eq!(ContractManager::contract_id("no id here"), None);
    }

    #[test]
    fn test_details_deserialize_partially() {
        let details: ContractDetails =
            serde_json::from_str(r#"{"property":{"price":"500000","contractId":"C-1"}}"#).unwrap();

        assert_eq!(details, ContractDetails::with_price("500000", "C-1"));
    }
}
