//! Supplier qualification: supplier profiles, their financials, past
//! supplier relationships and regional benchmarks.

use mockgraph_generate::{
    Domain, FieldPlan, FieldRef, GenerationError, IdPattern, Policy, PolicyTable, RecordDraft,
    Result, Sampler, TableSpec, Value,
};

use crate::support::{catch_phrase, company_with_suffix, iso_date};

pub const NAME: &str = "supplier";

pub const OUTCOMES: &[&str] = &[
    "highly_successful",
    "successful",
    "satisfactory",
    "problematic",
    "terminated_early",
];
/// Outcomes counted as a good relationship.
pub const SUCCESSFUL: &[&str] = &["highly_successful", "successful", "satisfactory"];
const UNSUCCESSFUL: &[&str] = &["problematic", "terminated_early"];

pub const CREDIT_RATINGS: &[&str] = &[
    "AAA", "AA", "A+", "A", "A-", "BBB+", "BBB", "BBB-", "BB+", "BB", "B+", "B",
];
/// Investment-grade ratings.
pub const HEALTHY_RATINGS: &[&str] = &["AAA", "AA", "A+", "A", "A-", "BBB+", "BBB", "BBB-"];
const WEAK_RATINGS: &[&str] = &["BB+", "BB", "B+", "B"];

struct Country {
    name: &'static str,
    cities: &'static [&'static str],
    language: &'static str,
}

const COUNTRIES: &[Country] = &[
    Country {
        name: "Vietnam",
        cities: &["Ho Chi Minh City", "Hanoi", "Da Nang"],
        language: "Vietnamese",
    },
    Country {
        name: "China",
        cities: &["Shenzhen", "Shanghai", "Guangzhou", "Beijing"],
        language: "Mandarin",
    },
    Country {
        name: "Mexico",
        cities: &["Monterrey", "Guadalajara", "Tijuana"],
        language: "Spanish",
    },
    Country {
        name: "Thailand",
        cities: &["Bangkok", "Chiang Mai", "Phuket"],
        language: "Thai",
    },
    Country {
        name: "India",
        cities: &["Bangalore", "Mumbai", "Chennai", "Pune"],
        language: "Hindi",
    },
    Country {
        name: "Poland",
        cities: &["Warsaw", "Krakow", "Wroclaw"],
        language: "Polish",
    },
    Country {
        name: "Malaysia",
        cities: &["Kuala Lumpur", "Penang", "Johor Bahru"],
        language: "Malay",
    },
    Country {
        name: "Taiwan",
        cities: &["Taipei", "Taichung", "Kaohsiung"],
        language: "Mandarin",
    },
];

const CERTIFICATIONS: &[&str] = &[
    "ISO9001",
    "ISO14001",
    "IATF16949",
    "ISO13485",
    "ISO27001",
    "OHSAS18001",
];
const PRODUCTS: &[&str] = &[
    "electronic components",
    "pcb assembly",
    "sensors",
    "connectors",
    "switches",
    "cables",
    "power supplies",
    "motors",
    "displays",
    "housings",
    "fasteners",
];
const OWNERSHIP: &[&str] = &["private", "public", "family_owned", "foreign_owned"];
const PAYMENT_TERMS: &[&str] = &["Net 30", "Net 45", "Net 60", "Net 90", "2/10 Net 30"];
const QUALITY_SYSTEMS: &[&str] = &[
    "ISO9001:2015",
    "ISO9001:2008",
    "IATF16949:2016",
    "AS9100",
    "ISO13485:2016",
];
const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CNY", "JPY"];

const HISTORY_ISSUES: &[&str] = &[
    "occasional shipping delays during monsoon season",
    "documentation errors in first 6 months",
    "quality escape incidents",
    "communication challenges",
    "capacity constraints during peak season",
    "customs clearance delays",
    "packaging issues",
    "late deliveries",
    "inconsistent quality",
    "pricing disputes",
];
const HISTORY_STRENGTHS: &[&str] = &[
    "excellent communication",
    "flexible with urgent orders",
    "continuous improvement mindset",
    "strong technical capabilities",
    "responsive customer service",
    "competitive pricing",
    "reliable delivery",
    "high quality standards",
    "good problem-solving",
    "transparent operations",
];

const BENCHMARK_REGIONS: &[(&str, &[&str])] = &[
    (
        "Southeast Asia",
        &["Vietnam", "Thailand", "Malaysia", "Indonesia", "Philippines"],
    ),
    ("East Asia", &["China", "Taiwan", "South Korea", "Japan"]),
    ("South Asia", &["India", "Bangladesh", "Pakistan", "Sri Lanka"]),
    (
        "Eastern Europe",
        &["Poland", "Czech Republic", "Hungary", "Romania", "Bulgaria"],
    ),
    (
        "Latin America",
        &["Mexico", "Brazil", "Colombia", "Chile", "Argentina"],
    ),
    ("North Africa", &["Egypt", "Morocco", "Tunisia"]),
    ("Middle East", &["Turkey", "UAE", "Saudi Arabia"]),
];
const BENCHMARK_INDUSTRIES: &[&str] = &[
    "Electronics Manufacturing",
    "Automotive Components",
    "Textiles",
    "Machinery",
    "Plastics",
    "Metal Fabrication",
    "Chemicals",
    "Pharmaceuticals",
    "Food Processing",
    "Packaging",
];
const BENCHMARK_ISSUES: &[&str] = &[
    "shipping delays during monsoon",
    "documentation accuracy",
    "language barriers",
    "customs clearance delays",
    "quality consistency",
    "capacity constraints",
    "infrastructure limitations",
    "currency fluctuation impact",
];
const BENCHMARK_SUCCESS_FACTORS: &[&str] = &[
    "strong technical capabilities",
    "competitive pricing",
    "improving infrastructure",
    "skilled workforce",
    "government support",
    "established supply chains",
    "quality focus",
    "innovation capability",
];
const BENCHMARK_RISKS: &[&str] = &[
    "political stability concerns",
    "currency fluctuation",
    "supply chain disruptions",
    "regulatory changes",
    "natural disasters",
    "infrastructure gaps",
    "talent retention",
    "intellectual property concerns",
];

pub fn domain() -> Result<Domain> {
    Ok(Domain::new(NAME, "supplier qualification and risk")
        .with_table(suppliers()?)
        .with_table(supplier_financials())
        .with_table(supplier_history()?)
        .with_table(regional_benchmarks()))
}

fn suppliers() -> Result<TableSpec> {
    let mut cities = PolicyTable::new("city");
    let mut languages = PolicyTable::new("languages_spoken");
    for country in COUNTRIES {
        cities = cities.with(country.name, Policy::one_of(country.cities.iter().copied()));
        languages = languages.with(
            country.name,
            Policy::fixed(vec![Value::from("English"), Value::from(country.language)]),
        );
    }

    let plan = FieldPlan::new()
        .id("supplier_id", IdPattern::parse("SUP-{int:1000-9999}")?)
        .derive(
            "company_name",
            company_with_suffix(&["Manufacturing", "Industries", "Ltd", "Corp", "Co.", "Systems"]),
        )
        .draw(
            "country",
            Policy::one_of(COUNTRIES.iter().map(|country| country.name)),
        )
        .conditional("city", FieldRef::own("country"), cities)
        .draw("years_in_business", Policy::int(3, 30))
        .draw("employee_count", Policy::int(50, 1_500))
        .draw("ownership", Policy::one_of(OWNERSHIP.iter().copied()))
        .draw("certifications", Policy::subset(CERTIFICATIONS.iter().copied(), 1, 4))
        .draw("annual_capacity", Policy::int(500_000, 5_000_000))
        .draw("current_utilization", Policy::real(0.55, 0.95, 2))
        .draw("primary_products", Policy::subset(PRODUCTS.iter().copied(), 2, 4))
        .draw("secondary_products", Policy::subset(PRODUCTS.iter().copied(), 1, 3))
        .draw("lead_time_days", Policy::int(20, 90))
        .draw("min_order_quantity", Policy::int(500, 10_000))
        .draw("annual_revenue_usd", Policy::int(5_000_000, 50_000_000))
        .draw("credit_rating", Policy::one_of(CREDIT_RATINGS.iter().copied()))
        .draw("payment_terms", Policy::one_of(PAYMENT_TERMS.iter().copied()))
        .draw("preferred_currencies", Policy::subset(CURRENCIES.iter().copied(), 1, 2))
        .conditional("languages_spoken", FieldRef::own("country"), languages)
        .draw("quality_mgmt_system", Policy::one_of(QUALITY_SYSTEMS.iter().copied()));

    Ok(TableSpec::new("suppliers", 80, plan))
}

fn by_rating(field: &str, healthy: Policy, weak: Policy) -> PolicyTable {
    PolicyTable::new(field)
        .with_all(HEALTHY_RATINGS, healthy)
        .with_all(WEAK_RATINGS, weak)
}

fn supplier_financials() -> TableSpec {
    let rating = || FieldRef::parent("credit_rating");
    let plan = FieldPlan::new()
        .copy("supplier_id", FieldRef::parent("supplier_id"))
        .draw("year", Policy::fixed(2024_i64))
        .copy("revenue_usd", FieldRef::parent("annual_revenue_usd"))
        .draw("revenue_growth_yoy", Policy::real(-0.05, 0.25, 2))
        .conditional(
            "profit_margin",
            rating(),
            by_rating(
                "profit_margin",
                Policy::real(0.08, 0.18, 2),
                Policy::real(0.02, 0.10, 2),
            ),
        )
        .conditional(
            "debt_to_equity",
            rating(),
            by_rating(
                "debt_to_equity",
                Policy::real(0.2, 0.6, 2),
                Policy::real(0.6, 1.5, 2),
            ),
        )
        .conditional(
            "current_ratio",
            rating(),
            by_rating(
                "current_ratio",
                Policy::real(1.3, 2.5, 1),
                Policy::real(0.8, 1.3, 1),
            ),
        )
        .conditional(
            "quick_ratio",
            rating(),
            by_rating(
                "quick_ratio",
                Policy::real(1.0, 2.0, 1),
                Policy::real(0.5, 1.0, 1),
            ),
        )
        .conditional(
            "credit_score",
            rating(),
            by_rating("credit_score", Policy::int(65, 95), Policy::int(40, 65)),
        )
        .copy("credit_rating", rating())
        .draw("days_sales_outstanding", Policy::int(30, 90))
        .draw("inventory_turnover", Policy::real(4.0, 12.0, 1))
        .conditional(
            "bankruptcy_risk",
            rating(),
            by_rating(
                "bankruptcy_risk",
                Policy::fixed("low"),
                Policy::one_of(["low", "medium", "medium", "high"]),
            ),
        )
        .conditional(
            "financial_stability_score",
            rating(),
            by_rating(
                "financial_stability_score",
                Policy::real(7.0, 9.5, 1),
                Policy::real(4.0, 7.0, 1),
            ),
        );

    TableSpec::new("supplier_financials", 0, plan).per_parent("suppliers")
}

fn by_outcome(field: &str, successful: Policy, unsuccessful: Policy) -> PolicyTable {
    PolicyTable::new(field)
        .with_all(SUCCESSFUL, successful)
        .with_all(UNSUCCESSFUL, unsuccessful)
}

fn supplier_history() -> Result<TableSpec> {
    let outcome = || FieldRef::own("result");
    let plan = FieldPlan::new()
        .draw("result", Policy::one_of(OUTCOMES.iter().copied()))
        .hidden()
        .draw("start_year", Policy::int(2015, 2021))
        .hidden()
        .draw("duration", Policy::real(1.0, 8.0, 2))
        .hidden()
        .id("relationship_id", IdPattern::parse("REL-{seq:3}")?)
        .derive("supplier_id", |draft, _| {
            Ok(Value::Text(format!("SUP-HIST-{:03}", draft.index() + 1)))
        })
        .derive(
            "company_name",
            company_with_suffix(&["Manufacturing", "Industries", "Ltd"]),
        )
        .draw(
            "country",
            Policy::one_of(COUNTRIES.iter().map(|country| country.name)),
        )
        .draw("employee_count", Policy::int(80, 800))
        .draw("products", Policy::subset(PRODUCTS[..6].iter().copied(), 1, 3))
        .derive("start_date", |draft, sampler| {
            let month = sampler.integer(1, 12)?;
            Ok(Value::Text(iso_date(draft.int("start_year")?, month, 1)?))
        })
        .derive("end_date", end_date)
        .copy("relationship_duration_years", FieldRef::own("duration"))
        .draw("total_orders", Policy::int(20, 250))
        .draw("total_value_usd", Policy::int(500_000, 10_000_000))
        .conditional(
            "avg_defect_rate",
            outcome(),
            by_outcome(
                "avg_defect_rate",
                Policy::real(0.010, 0.035, 3),
                Policy::real(0.040, 0.080, 3),
            ),
        )
        .conditional(
            "on_time_delivery_rate",
            outcome(),
            by_outcome(
                "on_time_delivery_rate",
                Policy::real(0.85, 0.98, 2),
                Policy::real(0.65, 0.82, 2),
            ),
        )
        .draw("response_time_hours", Policy::int(2, 48))
        .conditional(
            "quality_incidents",
            outcome(),
            by_outcome("quality_incidents", Policy::int(0, 5), Policy::int(0, 15)),
        )
        .conditional(
            "issues_encountered",
            outcome(),
            by_outcome(
                "issues_encountered",
                Policy::subset(HISTORY_ISSUES.iter().copied(), 0, 2),
                Policy::subset(HISTORY_ISSUES.iter().copied(), 2, 5),
            ),
        )
        .conditional(
            "strengths",
            outcome(),
            by_outcome(
                "strengths",
                Policy::subset(HISTORY_STRENGTHS.iter().copied(), 3, 6),
                Policy::subset(HISTORY_STRENGTHS.iter().copied(), 1, 3),
            ),
        )
        .conditional(
            "overall_rating",
            outcome(),
            by_outcome(
                "overall_rating",
                Policy::real(3.8, 4.9, 1),
                Policy::real(2.0, 3.5, 1),
            ),
        )
        .copy("overall_outcome", outcome())
        .conditional(
            "would_recommend",
            outcome(),
            PolicyTable::membership("would_recommend", OUTCOMES, SUCCESSFUL)?,
        )
        .derive("notes", catch_phrase);

    Ok(TableSpec::new("supplier_history", 250, plan))
}

/// Relationships that were terminated or lasted under five years have an
/// end date; long-running ones are still active.
fn end_date(draft: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let duration = draft
        .get("duration")
        .and_then(Value::as_f64)
        .ok_or_else(|| GenerationError::InvalidPlan("duration is not numeric".to_string()))?;
    let terminated = draft.text("result")? == "terminated_early";
    if !terminated && duration >= 5.0 {
        return Ok(Value::Null);
    }
    let month = sampler.integer(1, 12)?;
    let year = draft.int("start_year")? + duration.floor() as i64;
    Ok(Value::Text(iso_date(year, month, 1)?))
}

/// Region, country and industry of the `index`-th benchmark, enumerating
/// regions, then their countries, then industries.
pub fn benchmark_slot(index: usize) -> (&'static str, &'static str, &'static str) {
    let slots: Vec<(&str, &str)> = BENCHMARK_REGIONS
        .iter()
        .flat_map(|(region, countries)| countries.iter().map(move |country| (*region, *country)))
        .collect();
    let total = slots.len() * BENCHMARK_INDUSTRIES.len();
    let index = index % total;
    let (region, country) = slots[index / BENCHMARK_INDUSTRIES.len()];
    (
        region,
        country,
        BENCHMARK_INDUSTRIES[index % BENCHMARK_INDUSTRIES.len()],
    )
}

fn regional_benchmarks() -> TableSpec {
    let plan = FieldPlan::new()
        .derive("region", |draft, _| Ok(Value::from(benchmark_slot(draft.index()).0)))
        .derive("country", |draft, _| Ok(Value::from(benchmark_slot(draft.index()).1)))
        .derive("industry", |draft, _| Ok(Value::from(benchmark_slot(draft.index()).2)))
        .draw("avg_defect_rate", Policy::real(0.020, 0.055, 3))
        .draw("avg_on_time_delivery", Policy::real(0.82, 0.95, 2))
        .draw("avg_lead_time_days", Policy::int(28, 65))
        .draw("avg_labor_cost_hourly_usd", Policy::real(2.0, 15.0, 1))
        .draw("avg_shipping_cost_usd_per_kg", Policy::real(1.5, 5.0, 1))
        .draw(
            "typical_payment_terms",
            Policy::one_of(["Net 30", "Net 45", "Net 60"]),
        )
        .draw(
            "common_certifications",
            Policy::exactly(CERTIFICATIONS[..4].iter().copied(), 2),
        )
        .draw("common_issues", Policy::subset(BENCHMARK_ISSUES.iter().copied(), 2, 4))
        .draw(
            "success_factors",
            Policy::subset(BENCHMARK_SUCCESS_FACTORS.iter().copied(), 2, 4),
        )
        .draw("risk_factors", Policy::subset(BENCHMARK_RISKS.iter().copied(), 2, 4));

    TableSpec::new("regional_benchmarks", 80, plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_slots_enumerate_regions_in_order() {
        assert_eq!(
            benchmark_slot(0),
            ("Southeast Asia", "Vietnam", "Electronics Manufacturing")
        );
        assert_eq!(benchmark_slot(11), ("Southeast Asia", "Thailand", "Automotive Components"));
        assert_eq!(benchmark_slot(50), ("East Asia", "China", "Electronics Manufacturing"));
    }

    #[test]
    fn every_rating_has_a_financial_policy() {
        let table = by_rating("profit_margin", Policy::int(1, 2), Policy::int(3, 4));
        for rating in CREDIT_RATINGS {
            assert!(table.lookup(rating).is_ok(), "{rating}");
        }
    }
}
