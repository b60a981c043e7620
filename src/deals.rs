//! Deal pipeline records and stage transitions.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

use crate::data::{Comparable, LeaseId};
use crate::errors::CompsError;
use crate::types::DealId;

/// Pipeline column a deal sits in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStage {
    /// Initial inquiry received.
    #[default]
    #[serde(alias = "Initial Inquiry")]
    Initial,
    /// Tenant requirements being qualified.
    #[serde(alias = "Qualification")]
    Qualification,
    /// Financials under review.
    #[serde(alias = "Underwriting")]
    Underwriting,
    /// Letter of intent sent.
    #[serde(alias = "LOI Sent")]
    Loi,
    /// Terms under negotiation.
    #[serde(alias = "Negotiation")]
    Negotiation,
    /// Lease drafted for signature.
    #[serde(alias = "Contract")]
    Contract,
    /// Executed or closing.
    #[serde(alias = "Closing")]
    Closing,
}

impl DealStage {
    /// Stages in pipeline order.
    pub const ALL: [DealStage; 7] = [
        DealStage::Initial,
        DealStage::Qualification,
        DealStage::Underwriting,
        DealStage::Loi,
        DealStage::Negotiation,
        DealStage::Contract,
        DealStage::Closing,
    ];

    /// Stable identifier used in persisted deals.
    pub const fn id(&self) -> &'static str {
        match self {
            DealStage::Initial => "initial",
            DealStage::Qualification => "qualification",
            DealStage::Underwriting => "underwriting",
            DealStage::Loi => "loi",
            DealStage::Negotiation => "negotiation",
            DealStage::Contract => "contract",
            DealStage::Closing => "closing",
        }
    }

    /// Column heading.
    pub const fn display_name(&self) -> &'static str {
        match self {
            DealStage::Initial => "Initial Inquiry",
            DealStage::Qualification => "Qualification",
            DealStage::Underwriting => "Underwriting",
            DealStage::Loi => "LOI Sent",
            DealStage::Negotiation => "Negotiation",
            DealStage::Contract => "Contract",
            DealStage::Closing => "Closing",
        }
    }

    /// Resolve a stage from its id or display name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.id() == value || stage.display_name() == value)
    }
}

/// Deal priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

/// File attached to a deal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDocument {
    /// Document id, unique within its deal.
    pub id: String,
    /// File name.
    pub name: String,
    /// Human-readable size such as `2.5 MB`.
    pub size: String,
    /// Uploader display name.
    pub uploaded_by: String,
    /// Version label such as `1.0`.
    pub version: String,
    /// RFC 3339 upload timestamp text.
    pub upload_date: String,
    /// MIME type.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Editable deal fields, as submitted from a deal form.
///
/// Numeric fields accept JSON numbers, numeric strings, or empty strings
/// (stored forms keep raw input text).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealDetails {
    /// Deal name shown on pipeline cards.
    pub title: String,
    /// Prospective tenant.
    pub tenant_name: String,
    /// Property address.
    pub address: String,
    /// City name.
    pub city: String,
    /// Submarket name.
    pub market: String,
    /// Space type such as `Office` or `Retail`.
    pub space_type: String,
    /// Requested area, if entered.
    #[serde(deserialize_with = "lenient_u64")]
    pub transaction_sqft: Option<u64>,
    /// Floor numbers or ranges.
    pub floors_occupied: String,
    /// Target or actual execution date text.
    pub execution_date: String,
    /// Term text such as `10 years`.
    pub lease_term: String,
    /// Expiration date text.
    pub expiration_date: String,
    /// Tenant ownership type.
    pub tenant_ownership: String,
    /// Quarter label such as `Q1 2024`.
    pub transaction_quarter: String,
    /// Proposed starting rent per square foot per year.
    #[serde(deserialize_with = "lenient_f64")]
    pub starting_rent: Option<f64>,
    /// Effective rent after concessions.
    #[serde(deserialize_with = "lenient_f64")]
    pub effective_rent: Option<f64>,
    /// Tenant improvement allowance.
    #[serde(deserialize_with = "lenient_f64")]
    pub work_value: Option<f64>,
    /// Free rent concession text.
    pub free_rent: String,
    /// Deal type such as `New Lease`.
    pub transaction_type: String,
    /// Escalation schedule text.
    pub rent_schedule: String,
    /// Fixed escalation amount text.
    pub rent_bump_dollar: String,
    /// Percentage escalation text.
    pub rent_bump_percent: String,
    /// Free-text notes.
    pub comments: String,
    /// Pipeline priority.
    pub priority: Priority,
    /// Contact names.
    pub contacts: Vec<String>,
    /// Comparable leases attached to this deal.
    pub comparables: Vec<LeaseId>,
}

/// Deal fields without id, stage, or documents.
pub type DealDraft = DealDetails;

/// A deal tracked through the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    /// Unique deal id.
    pub id: DealId,
    /// Current pipeline stage.
    #[serde(default)]
    pub stage: DealStage,
    /// Uploaded documents.
    #[serde(default)]
    pub documents: Vec<DealDocument>,
    /// Editable fields, flattened into the deal JSON.
    #[serde(flatten)]
    pub details: DealDetails,
}

impl Deal {
    /// Comparables in `comps` attached to this deal, in `comps` order.
    pub fn resolve_comparables(&self, comps: &[Comparable]) -> Vec<Comparable> {
        resolve_comparables(self, comps)
    }
}

/// Add a new deal or replace the details of an existing one.
///
/// With `existing_id`, the matching deal keeps its id, stage, and documents;
/// an unknown id is an error. Without it, a new deal is appended in the
/// `Initial` stage with no documents. Returns the deal's id.
pub fn submit_deal(
    deals: &mut Vec<Deal>,
    details: DealDetails,
    existing_id: Option<&str>,
) -> Result<DealId, CompsError> {
    if let Some(id) = existing_id {
        let deal = deals
            .iter_mut()
            .find(|deal| deal.id == id)
            .ok_or_else(|| CompsError::NotFound(format!("deal {id}")))?;
        deal.details = details;
        return Ok(deal.id.clone());
    }
    let id = next_deal_id(deals);
    deals.push(Deal {
        id: id.clone(),
        stage: DealStage::Initial,
        documents: Vec::new(),
        details,
    });
    Ok(id)
}

/// Move the deal with `id` to `stage`.
pub fn move_deal(deals: &mut [Deal], id: &str, stage: DealStage) -> Result<(), CompsError> {
    let deal = deals
        .iter_mut()
        .find(|deal| deal.id == id)
        .ok_or_else(|| CompsError::NotFound(format!("deal {id}")))?;
    deal.stage = stage;
    Ok(())
}

/// Deals in `stage`, in list order.
pub fn deals_in_stage(deals: &[Deal], stage: DealStage) -> Vec<&Deal> {
    deals.iter().filter(|deal| deal.stage == stage).collect()
}

/// Comparables whose identity is attached to `deal`, in `comps` order.
pub fn resolve_comparables(deal: &Deal, comps: &[Comparable]) -> Vec<Comparable> {
    comps
        .iter()
        .filter(|comp| deal.details.comparables.iter().any(|id| id.matches(comp)))
        .cloned()
        .collect()
}

/// Millisecond timestamp id, bumped until unique within `deals`.
fn next_deal_id(deals: &[Deal]) -> DealId {
    let mut candidate = Utc::now().timestamp_millis();
    loop {
        let id = candidate.to_string();
        if deals.iter().all(|deal| deal.id != id) {
            return id;
        }
        candidate += 1;
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(NumberOrText::Number(number)) => Some(number),
        Some(NumberOrText::Text(text)) => text.trim().parse::<f64>().ok(),
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_f64(deserializer)?
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value.trunc() as u64))
}

fn document(
    id: &str,
    name: &str,
    size: &str,
    uploaded_by: &str,
    version: &str,
    upload_date: &str,
    kind: &str,
) -> DealDocument {
    DealDocument {
        id: id.to_string(),
        name: name.to_string(),
        size: size.to_string(),
        uploaded_by: uploaded_by.to_string(),
        version: version.to_string(),
        upload_date: upload_date.to_string(),
        kind: kind.to_string(),
    }
}

/// Sample deals shown when no deals have been saved yet.
pub fn seed_deals() -> Vec<Deal> {
    vec![
        Deal {
            id: "1".to_string(),
            stage: DealStage::Initial,
            documents: vec![
                document(
                    "1",
                    "lease_agreement.pdf",
                    "2.5 MB",
                    "John Smith",
                    "1.0",
                    "2024-02-15T10:30:00Z",
                    "application/pdf",
                ),
                document(
                    "2",
                    "floor_plans.dwg",
                    "5.1 MB",
                    "Sarah Johnson",
                    "1.0",
                    "2024-02-16T14:20:00Z",
                    "application/acad",
                ),
            ],
            details: DealDetails {
                title: "Downtown Office Complex".to_string(),
                tenant_name: "Acme Corp".to_string(),
                address: "123 Main St".to_string(),
                city: "New York".to_string(),
                market: "Manhattan".to_string(),
                space_type: "Office".to_string(),
                transaction_sqft: Some(25_000),
                floors_occupied: "15-17".to_string(),
                execution_date: "2024-02-15".to_string(),
                lease_term: "10 years".to_string(),
                expiration_date: "2034-02-15".to_string(),
                tenant_ownership: "Private".to_string(),
                transaction_quarter: "Q1 2024".to_string(),
                starting_rent: Some(85.0),
                effective_rent: Some(80.0),
                work_value: Some(2_500_000.0),
                free_rent: "6 months".to_string(),
                transaction_type: "New Lease".to_string(),
                rent_schedule: "Annual 3% increases".to_string(),
                rent_bump_percent: "3%".to_string(),
                comments: "Prime location with recent renovations".to_string(),
                priority: Priority::High,
                contacts: vec!["John Smith".to_string(), "Sarah Johnson".to_string()],
                ..DealDetails::default()
            },
        },
        Deal {
            id: "2".to_string(),
            stage: DealStage::Qualification,
            documents: vec![document(
                "3",
                "market_analysis.xlsx",
                "1.2 MB",
                "Mike Brown",
                "2.1",
                "2024-02-19T09:15:00Z",
                "application/vnd.ms-excel",
            )],
            details: DealDetails {
                title: "Retail Plaza Investment".to_string(),
                tenant_name: "Retail Co".to_string(),
                address: "456 Market St".to_string(),
                city: "New York".to_string(),
                market: "Brooklyn".to_string(),
                space_type: "Retail".to_string(),
                transaction_sqft: Some(15_000),
                floors_occupied: "1-2".to_string(),
                execution_date: "2024-02-20".to_string(),
                lease_term: "5 years".to_string(),
                expiration_date: "2029-02-20".to_string(),
                tenant_ownership: "Public".to_string(),
                transaction_quarter: "Q1 2024".to_string(),
                starting_rent: Some(120.0),
                effective_rent: Some(115.0),
                work_value: Some(1_500_000.0),
                free_rent: "3 months".to_string(),
                transaction_type: "New Lease".to_string(),
                rent_schedule: "Annual increases".to_string(),
                rent_bump_dollar: "5".to_string(),
                comments: "High foot traffic location".to_string(),
                priority: Priority::Medium,
                contacts: vec!["Mike Brown".to_string()],
                ..DealDetails::default()
            },
        },
        Deal {
            id: "3".to_string(),
            stage: DealStage::Underwriting,
            documents: vec![
                document(
                    "4",
                    "site_survey.pdf",
                    "8.3 MB",
                    "Emily Davis",
                    "1.0",
                    "2024-02-28T16:45:00Z",
                    "application/pdf",
                ),
                document(
                    "5",
                    "environmental_report.docx",
                    "3.7 MB",
                    "Tom Wilson",
                    "1.1",
                    "2024-03-01T11:20:00Z",
                    "application/msword",
                ),
            ],
            details: DealDetails {
                title: "Industrial Park Development".to_string(),
                tenant_name: "Logistics Inc".to_string(),
                address: "789 Industrial Ave".to_string(),
                city: "New York".to_string(),
                market: "Queens".to_string(),
                space_type: "Industrial".to_string(),
                transaction_sqft: Some(50_000),
                floors_occupied: "1".to_string(),
                execution_date: "2024-03-01".to_string(),
                lease_term: "15 years".to_string(),
                expiration_date: "2039-03-01".to_string(),
                tenant_ownership: "Private".to_string(),
                transaction_quarter: "Q1 2024".to_string(),
                starting_rent: Some(45.0),
                effective_rent: Some(42.0),
                work_value: Some(3_500_000.0),
                free_rent: "9 months".to_string(),
                transaction_type: "New Lease".to_string(),
                rent_schedule: "Annual 2.5% increases".to_string(),
                rent_bump_percent: "2.5%".to_string(),
                comments: "Modern distribution facility".to_string(),
                priority: Priority::High,
                contacts: vec!["Emily Davis".to_string(), "Tom Wilson".to_string()],
                ..DealDetails::default()
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Coordinates;

    fn lease(address: &str, tenant: &str, date: &str) -> Comparable {
        Comparable {
            address: address.to_string(),
            market: String::new(),
            city: String::new(),
            space_type: "Office".to_string(),
            execution_date: date.to_string(),
            comments: String::new(),
            transaction_sqft: 1000,
            tenant_name: tenant.to_string(),
            transaction_quarter: String::new(),
            tenant_ownership: String::new(),
            transaction_type: String::new(),
            starting_rent: 50.0,
            rent_schedule: String::new(),
            rent_bump_dollar: String::new(),
            rent_bump_percent: String::new(),
            free_rent: String::new(),
            work_value: "0".to_string(),
            effective_rent: "0".to_string(),
            floors_occupied: String::new(),
            lease_term: String::new(),
            expiration_date: String::new(),
            coordinates: Coordinates::new(1.0, 1.0),
        }
    }

    #[test]
    fn stages_round_trip_through_ids_and_names() {
        for stage in DealStage::ALL {
            assert_eq!(DealStage::parse(stage.id()), Some(stage));
            assert_eq!(DealStage::parse(stage.display_name()), Some(stage));
        }
        assert_eq!(DealStage::parse("archived"), None);
        let parsed: DealStage = serde_json::from_str("\"LOI Sent\"").unwrap();
        assert_eq!(parsed, DealStage::Loi);
        assert_eq!(serde_json::to_string(&DealStage::Loi).unwrap(), "\"loi\"");
    }

    #[test]
    fn submit_new_deal_starts_in_initial_stage() {
        let mut deals = seed_deals();
        let details = DealDetails {
            title: "Harbor Warehouse".to_string(),
            ..DealDetails::default()
        };
        let id = submit_deal(&mut deals, details, None).unwrap();
        assert_eq!(deals.len(), 4);
        let added = deals.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.stage, DealStage::Initial);
        assert!(added.documents.is_empty());
        assert_eq!(added.details.title, "Harbor Warehouse");
    }

    #[test]
    fn new_deal_ids_never_collide() {
        let mut deals = Vec::new();
        let first = submit_deal(&mut deals, DealDetails::default(), None).unwrap();
        let second = submit_deal(&mut deals, DealDetails::default(), None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn submit_existing_deal_keeps_stage_and_documents() {
        let mut deals = seed_deals();
        let mut details = deals[2].details.clone();
        details.title = "Industrial Park Phase II".to_string();
        let id = submit_deal(&mut deals, details, Some("3")).unwrap();
        assert_eq!(id, "3");
        assert_eq!(deals.len(), 3);
        assert_eq!(deals[2].stage, DealStage::Underwriting);
        assert_eq!(deals[2].documents.len(), 2);
        assert_eq!(deals[2].details.title, "Industrial Park Phase II");

        let missing = submit_deal(&mut deals, DealDetails::default(), Some("nope"));
        assert!(matches!(missing, Err(CompsError::NotFound(_))));
    }

    #[test]
    fn move_deal_changes_stage_or_reports_missing() {
        let mut deals = seed_deals();
        move_deal(&mut deals, "1", DealStage::Loi).unwrap();
        assert_eq!(deals[0].stage, DealStage::Loi);
        assert_eq!(deals_in_stage(&deals, DealStage::Loi).len(), 1);
        assert!(deals_in_stage(&deals, DealStage::Initial).is_empty());
        assert!(matches!(
            move_deal(&mut deals, "42", DealStage::Closing),
            Err(CompsError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_comparables_uses_structured_identity() {
        let comps = vec![
            lease("12-14 Main St", "Acme", "2024-01-15"),
            lease("12", "14 Main St-Acme", "2024-01-15"),
            lease("1 Pine St", "Beta", "2023-03-01"),
        ];
        let mut deals = seed_deals();
        deals[0].details.comparables = vec![comps[1].lease_id(), comps[2].lease_id()];
        let resolved = deals[0].resolve_comparables(&comps);
        assert_eq!(resolved, vec![comps[1].clone(), comps[2].clone()]);
    }

    #[test]
    fn stored_form_values_deserialize_leniently() {
        let json = r#"{
            "id": "99",
            "stage": "Initial Inquiry",
            "title": "Form Deal",
            "transactionSqft": "",
            "startingRent": "42.5",
            "workValue": 1000,
            "priority": "low",
            "contacts": [""]
        }"#;
        let deal: Deal = serde_json::from_str(json).unwrap();
        assert_eq!(deal.stage, DealStage::Initial);
        assert_eq!(deal.details.transaction_sqft, None);
        assert_eq!(deal.details.starting_rent, Some(42.5));
        assert_eq!(deal.details.work_value, Some(1000.0));
        assert_eq!(deal.details.effective_rent, None);
        assert_eq!(deal.details.priority, Priority::Low);
        assert!(deal.documents.is_empty());
    }

    #[test]
    fn deals_round_trip_through_json() {
        let deals = seed_deals();
        let json = serde_json::to_string(&deals).unwrap();
        assert!(json.contains("\"tenantName\":\"Acme Corp\""));
        assert!(json.contains("\"type\":\"application/pdf\""));
        let back: Vec<Deal> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, deals);
    }
}
