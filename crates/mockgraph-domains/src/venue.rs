//! Event venues: venue profiles, client profiles, historical events matched
//! to venues and open event requests.

use mockgraph_generate::{
    Domain, FieldPlan, FieldRef, GenerationError, IdPattern, LinkPolicy, Policy, PolicyTable, Record, RecordDraft,
    Result, Rounding, Sampler, Source, TableSpec, Value,
};

use crate::support::{
    catch_phrase, company_name, company_with_suffix, iso_date, street_address, title_case,
};

pub const NAME: &str = "venue";

pub const OUTCOMES: &[&str] = &[
    "highly_successful",
    "successful",
    "satisfactory",
    "below_expectations",
];
pub const SUCCESSFUL: &[&str] = &["highly_successful", "successful"];
const UNSUCCESSFUL: &[&str] = &["satisfactory", "below_expectations"];

/// Historical events are only matched against the first venues.
const HISTORY_VENUE_POOL: usize = 60;
const REQUEST_YEAR: i64 = 2026;

const CITIES: &[(&str, &str, &str)] = &[
    ("San Diego, CA", "CA", "West Coast"),
    ("San Francisco, CA", "CA", "West Coast"),
    ("Los Angeles, CA", "CA", "West Coast"),
    ("Seattle, WA", "WA", "West Coast"),
    ("Portland, OR", "OR", "West Coast"),
    ("Austin, TX", "TX", "Southwest"),
    ("Dallas, TX", "TX", "Southwest"),
    ("Phoenix, AZ", "AZ", "Southwest"),
    ("Denver, CO", "CO", "Mountain"),
    ("Chicago, IL", "IL", "Midwest"),
    ("Boston, MA", "MA", "Northeast"),
    ("New York, NY", "NY", "Northeast"),
    ("Miami, FL", "FL", "Southeast"),
    ("Atlanta, GA", "GA", "Southeast"),
];

const VENUE_TYPES: &[&str] = &[
    "hotel",
    "convention_center",
    "conference_center",
    "resort",
    "university",
    "historic_venue",
];
const VENUE_NAME_TYPES: &[&str] = &[
    "Center",
    "Hall",
    "Convention Center",
    "Hotel & Conference Center",
    "Resort",
    "Pavilion",
];
const VENUE_AMENITIES: &[&str] = &[
    "av_equipment",
    "catering",
    "wifi",
    "parking",
    "virtual_streaming",
    "breakout_rooms",
    "stage",
    "green_room",
    "coat_check",
    "registration_area",
];
const VENUE_FEATURES: &[&str] = &[
    "ocean_views",
    "mountain_views",
    "city_views",
    "outdoor_space",
    "rooftop_terrace",
    "tech_support_staff",
    "loading_dock",
    "accessible",
    "natural_light",
    "historic_architecture",
];
const CATERING_OPTIONS: &[&str] = &[
    "in_house",
    "preferred_vendors",
    "bring_your_own",
    "multiple_options",
];
const CANCELLATION_POLICIES: &[&str] = &["30_days", "60_days", "90_days", "flexible", "non_refundable"];

const EVENT_TYPES: &[&str] = &[
    "corporate_conference",
    "training",
    "product_launch",
    "gala",
    "awards_ceremony",
    "trade_show",
    "workshop",
    "team_building",
    "annual_meeting",
    "client_appreciation",
];
const EVENT_STYLES: &[&str] = &["in_person", "hybrid_in_person_virtual", "virtual"];
const KEY_REQUIREMENTS: &[&str] = &[
    "large main hall",
    "breakout rooms",
    "streaming capability",
    "stage",
    "outdoor space",
    "flexible seating",
    "natural light",
    "tech support",
];
const REQUIREMENTS_MET: &[&str] = &["capacity", "amenities", "location", "budget", "dates", "style"];
const POSITIVE_FEEDBACK: &[&str] = &[
    "Excellent AV support throughout",
    "Staff very responsive to last-minute changes",
    "Breakout rooms perfect size",
    "Virtual streaming worked flawlessly",
    "Great natural light in main hall",
    "Food was exceptional",
    "Easy check-in process",
    "Tech support team was outstanding",
    "Beautiful venue atmosphere",
    "Perfect location for attendees",
];
const NEGATIVE_FEEDBACK: &[&str] = &[
    "Parking was tight during peak hours",
    "Catering setup took longer than expected",
    "Some AV equipment needed troubleshooting",
    "Temperature control issues in one room",
    "Noise from adjacent event",
    "WiFi struggled with high usage",
    "Registration area too small",
    "Limited elevator access",
];
const EVENT_SUCCESS_FACTORS: &[&str] = &[
    "great breakout rooms",
    "in-house tech support",
    "flexible staff",
    "ocean views",
    "modern facilities",
    "excellent catering",
    "ample parking",
];
const MINOR_CHALLENGES: &[&str] = &["parking logistics", "last-minute room changes", "weather"];
const MAJOR_CHALLENGES: &[&str] = &[
    "capacity issues",
    "AV problems",
    "catering delays",
    "poor communication",
];

const CLIENT_INDUSTRIES: &[&str] = &[
    "technology",
    "financial_services",
    "healthcare",
    "manufacturing",
    "consulting",
    "real_estate",
    "media",
    "education",
    "non_profit",
];
const COMPANY_SIZES: &[&str] = &["small", "medium", "large", "enterprise"];
const CLIENT_EVENT_TYPES: &[&str] = &[
    "corporate_conference",
    "training",
    "gala",
    "product_launch",
    "team_building",
];
const LOYALTY_TIERS: &[&str] = &["bronze", "silver", "gold", "platinum"];

const REQUEST_EVENT_TYPES: &[&str] = &[
    "corporate_conference",
    "training",
    "product_launch",
    "gala",
    "annual_meeting",
];
const REQUEST_REGIONS: &[&str] = &["West Coast", "East Coast", "Midwest", "Southwest", "Southeast"];
const REQUEST_AMENITIES: &[&str] = &[
    "av_equipment",
    "breakout_rooms",
    "catering",
    "wifi",
    "parking",
    "virtual_streaming",
    "stage",
    "outdoor_space",
];
const REQUEST_CITIES: &[&str] = &[
    "San Diego",
    "San Francisco",
    "Los Angeles",
    "Seattle",
    "Boston",
    "Chicago",
];
const SPECIAL_REQUIREMENTS: &[&str] = &[
    "stage for presentations",
    "minimum 4 breakout rooms",
    "dietary restrictions catering",
    "accessible venue required",
    "loading dock access",
    "green room needed",
];
const CLIENT_PREFERENCES: &[&str] = &[
    "modern facilities",
    "responsive staff",
    "strong AV support",
    "natural light",
    "flexible spaces",
    "experienced event team",
];

pub fn domain() -> Result<Domain> {
    Ok(Domain::new(NAME, "event venue matching")
        .with_table(venues()?)
        .with_table(client_profiles()?)
        .with_table(event_history()?)
        .with_table(current_requests()?))
}

fn venues() -> Result<TableSpec> {
    let mut states = PolicyTable::new("state");
    let mut regions = PolicyTable::new("region");
    for (city, state, region) in CITIES {
        states = states.with(*city, Policy::fixed(*state));
        regions = regions.with(*city, Policy::fixed(*region));
    }

    let plan = FieldPlan::new()
        .id("venue_id", IdPattern::parse("VEN-{int:100-999}")?)
        .derive("name", company_with_suffix(VENUE_NAME_TYPES))
        .draw("venue_type", Policy::one_of(VENUE_TYPES.iter().copied()))
        .draw("city", Policy::one_of(CITIES.iter().map(|(city, _, _)| *city)))
        .conditional("state", FieldRef::own("city"), states)
        .conditional("region", FieldRef::own("city"), regions)
        .derive("address", |draft, sampler| {
            let street = street_address(draft, sampler)?;
            Ok(Value::Text(format!(
                "{}, {}",
                street.as_str().unwrap_or_default(),
                draft.text("city")?
            )))
        })
        .draw("established_year", Policy::int(1990, 2020))
        .draw("max_capacity", Policy::int(100, 1_000))
        .scaled(
            "min_capacity",
            Source::own("max_capacity"),
            Policy::fixed(0.1),
            Rounding::Floor,
        )
        .draw("total_sqft", Policy::int(15_000, 50_000))
        .draw("meeting_rooms", Policy::int(4, 20))
        .draw("largest_room_sqft", Policy::int(5_000, 15_000))
        .scaled(
            "ballroom_capacity",
            Source::own("max_capacity"),
            Policy::fixed(0.8),
            Rounding::Floor,
        )
        .draw("daily_rate", Policy::int(5_000, 25_000))
        .scaled(
            "half_day_rate",
            Source::own("daily_rate"),
            Policy::fixed(0.6),
            Rounding::Floor,
        )
        .draw("setup_fee", Policy::int(1_000, 3_000))
        .draw("amenities", Policy::subset(VENUE_AMENITIES.iter().copied(), 5, 9))
        .draw("features", Policy::subset(VENUE_FEATURES.iter().copied(), 2, 6))
        .draw(
            "catering_options",
            Policy::subset(CATERING_OPTIONS.iter().copied(), 1, 2),
        )
        .draw("av_included", Policy::one_of([true, false]))
        .draw("parking_spaces", Policy::int(50, 400))
        .draw("nearby_hotels", Policy::int(3, 25))
        .draw("airport_distance_miles", Policy::real(2.0, 30.0, 1))
        .draw("public_transit", Policy::one_of([true, false]))
        .draw("past_events_count", Policy::int(10, 150))
        .draw("avg_client_rating", Policy::real(3.8, 4.9, 1))
        .draw(
            "cancellation_policy",
            Policy::one_of(CANCELLATION_POLICIES.iter().copied()),
        );

    Ok(TableSpec::new("venues", 120, plan))
}

fn client_profiles() -> Result<TableSpec> {
    let plan = FieldPlan::new()
        .id("client_id", IdPattern::parse("CLI-{int:100-999}")?)
        .derive("company_name", company_name)
        .draw("industry", Policy::one_of(CLIENT_INDUSTRIES.iter().copied()))
        .draw("company_size", Policy::one_of(COMPANY_SIZES.iter().copied()))
        .draw("avg_event_size", Policy::int(50, 500))
        .draw("events_per_year", Policy::int(1, 12))
        .derive("total_events_booked", |draft, sampler| {
            let per_year = draft.int("events_per_year")?;
            Ok(Value::Int(sampler.integer(per_year, per_year * 5)?))
        })
        .draw("avg_budget", Policy::int(30_000, 150_000))
        .draw(
            "preferred_regions",
            Policy::subset(["West Coast", "East Coast", "Midwest", "Southwest"], 1, 3),
        )
        .draw(
            "preferred_venue_types",
            Policy::subset(VENUE_TYPES[..4].iter().copied(), 1, 2),
        )
        .draw(
            "required_amenities",
            Policy::exactly(["av_equipment", "catering", "wifi", "parking"], 3),
        )
        .draw("event_types", Policy::subset(CLIENT_EVENT_TYPES.iter().copied(), 2, 4))
        .draw("satisfaction_score", Policy::real(3.5, 4.9, 1))
        .draw("loyalty_tier", Policy::one_of(LOYALTY_TIERS.iter().copied()))
        .derive("special_notes", catch_phrase);

    Ok(TableSpec::new("client_profiles", 80, plan))
}

fn by_outcome(field: &str, successful: Policy, unsuccessful: Policy) -> PolicyTable {
    PolicyTable::new(field)
        .with_all(SUCCESSFUL, successful)
        .with_all(UNSUCCESSFUL, unsuccessful)
}

fn event_dates(year: i64, month: i64) -> Result<Value> {
    Ok(Value::List(vec![
        Value::Text(iso_date(year, month, 15)?),
        Value::Text(iso_date(year, month, 16)?),
    ]))
}

fn event_history() -> Result<TableSpec> {
    let outcome = || FieldRef::own("result");
    let rating = |field: &str, good: (f64, f64), poor: (f64, f64)| {
        by_outcome(
            field,
            Policy::real(good.0, good.1, 1),
            Policy::real(poor.0, poor.1, 1),
        )
    };

    let plan = FieldPlan::new()
        .draw("result", Policy::one_of(OUTCOMES.iter().copied()))
        .hidden()
        .draw("year", Policy::int(2020, 2024))
        .hidden()
        .draw("month", Policy::int(1, 12))
        .hidden()
        .draw("kind", Policy::one_of(EVENT_TYPES.iter().copied()))
        .hidden()
        .reference("client", "client_profiles")
        .hidden()
        .id("event_id", IdPattern::parse("EVT-{field:year}-{seq:3}")?)
        .derive("event_name", |draft, sampler| {
            let company = company_name(draft, sampler)?;
            Ok(Value::Text(format!(
                "{} {} {}",
                company.as_str().unwrap_or_default(),
                title_case(draft.text("kind")?),
                draft.int("year")?
            )))
        })
        .copy("event_type", FieldRef::own("kind"))
        .copy("client_id", FieldRef::own("client.client_id"))
        .copy("client_name", FieldRef::own("client.company_name"))
        .derive("attendee_count", |draft, sampler| {
            let capacity = draft
                .lookup(&FieldRef::parent("max_capacity"))?
                .as_i64()
                .ok_or_else(|| {
                    GenerationError::InvalidPlan(
                        "parent field 'max_capacity' is not an integer".to_string(),
                    )
                })?;
            let ceiling = (capacity as f64 * 0.9).floor() as i64;
            Ok(Value::Int(sampler.integer(50, ceiling)?))
        })
        .draw("duration_days", Policy::int(1, 3))
        .derive("event_dates", |draft, _| {
            event_dates(draft.int("year")?, draft.int("month")?)
        })
        .copy("venue_id", FieldRef::parent("venue_id"))
        .copy("venue_name", FieldRef::parent("name"))
        .copy("city", FieldRef::parent("city"))
        .scaled(
            "venue_charge",
            Source::parent("daily_rate"),
            Policy::int(1, 3),
            Rounding::Integer,
        )
        .hidden()
        .scaled(
            "catering_charge",
            Source::own("attendee_count"),
            Policy::int(50, 120),
            Rounding::Integer,
        )
        .hidden()
        .sum(
            "total_cost",
            vec![
                Source::own("venue_charge"),
                Source::own("catering_charge"),
                Source::Draw(Policy::int(5_000, 15_000)),
            ],
        )
        .copy("venue_cost", FieldRef::own("venue_charge"))
        .copy("catering_cost", FieldRef::own("catering_charge"))
        .draw("av_cost", Policy::int(3_000, 12_000))
        .draw("other_costs", Policy::int(2_000, 10_000))
        .conditional(
            "budget_met",
            outcome(),
            by_outcome(
                "budget_met",
                Policy::fixed(true),
                Policy::one_of([true, false]),
            ),
        )
        .draw("event_style", Policy::one_of(EVENT_STYLES.iter().copied()))
        .draw(
            "key_requirements",
            Policy::subset(KEY_REQUIREMENTS.iter().copied(), 3, 6),
        )
        .conditional(
            "requirements_met",
            outcome(),
            by_outcome(
                "requirements_met",
                Policy::subset(REQUIREMENTS_MET.iter().copied(), 5, 6),
                Policy::subset(REQUIREMENTS_MET.iter().copied(), 3, 6),
            ),
        )
        .conditional(
            "client_rating",
            outcome(),
            rating("client_rating", (4.2, 4.9), (3.0, 4.0)),
        )
        .conditional(
            "venue_rating",
            outcome(),
            rating("venue_rating", (4.3, 4.9), (3.2, 4.1)),
        )
        .conditional(
            "catering_rating",
            outcome(),
            rating("catering_rating", (4.0, 4.8), (3.0, 4.0)),
        )
        .conditional(
            "av_rating",
            outcome(),
            rating("av_rating", (4.2, 4.9), (3.1, 4.0)),
        )
        .conditional(
            "overall_satisfaction",
            outcome(),
            rating("overall_satisfaction", (4.2, 4.9), (3.0, 4.0)),
        )
        .conditional(
            "positive_feedback",
            outcome(),
            by_outcome(
                "positive_feedback",
                Policy::subset(POSITIVE_FEEDBACK.iter().copied(), 3, 6),
                Policy::subset(POSITIVE_FEEDBACK.iter().copied(), 1, 3),
            ),
        )
        .conditional(
            "negative_feedback",
            outcome(),
            by_outcome(
                "negative_feedback",
                Policy::subset(NEGATIVE_FEEDBACK.iter().copied(), 0, 2),
                Policy::subset(NEGATIVE_FEEDBACK.iter().copied(), 2, 4),
            ),
        )
        .draw(
            "success_factors",
            Policy::subset(EVENT_SUCCESS_FACTORS.iter().copied(), 2, 5),
        )
        .conditional(
            "challenges",
            outcome(),
            by_outcome(
                "challenges",
                Policy::subset(MINOR_CHALLENGES.iter().copied(), 0, 2),
                Policy::subset(MAJOR_CHALLENGES.iter().copied(), 2, 4),
            ),
        )
        .copy("outcome", outcome())
        .conditional(
            "would_rebook",
            outcome(),
            PolicyTable::membership("would_rebook", OUTCOMES, SUCCESSFUL)?,
        )
        .conditional(
            "would_recommend",
            outcome(),
            PolicyTable::membership("would_recommend", OUTCOMES, SUCCESSFUL)?,
        )
        .conditional(
            "rebooking_likelihood",
            outcome(),
            rating("rebooking_likelihood", (0.7, 1.0), (0.2, 0.5)),
        )
        .derive("notes", catch_phrase);

    Ok(TableSpec::new("event_history", 500, plan)
        .child_of("venues", LinkPolicy::random_within(HISTORY_VENUE_POOL)))
}

fn location_requirements(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let region = sampler.one(REQUEST_REGIONS)?;
    let cities = sampler.many(REQUEST_CITIES, 3)?;
    let max_distance = sampler.integer(10, 30)?;
    Ok(Value::Object(Record::from_fields(vec![
        (
            "region".to_string(),
            Value::List(vec![Value::from(*region)]),
        ),
        (
            "cities".to_string(),
            Value::List(cities.into_iter().map(|city| Value::from(*city)).collect()),
        ),
        (
            "max_airport_distance_miles".to_string(),
            Value::Int(max_distance),
        ),
    ])))
}

fn current_requests() -> Result<TableSpec> {
    let plan = FieldPlan::new()
        .draw("month", Policy::int(1, 12))
        .hidden()
        .reference("client", "client_profiles")
        .hidden()
        .id("event_id", IdPattern::parse("EVT-2026-{seq:3}")?)
        .copy("client_id", FieldRef::own("client.client_id"))
        .copy("client_name", FieldRef::own("client.company_name"))
        .derive("event_name", |draft, sampler| {
            let phrase = catch_phrase(draft, sampler)?;
            Ok(Value::Text(format!(
                "{} {REQUEST_YEAR}",
                phrase.as_str().unwrap_or_default()
            )))
        })
        .draw("event_type", Policy::one_of(REQUEST_EVENT_TYPES.iter().copied()))
        .draw("attendee_count", Policy::int(100, 500))
        .draw("duration_days", Policy::int(1, 3))
        .derive("preferred_dates", |draft, _| {
            event_dates(REQUEST_YEAR, draft.int("month")?)
        })
        .draw("flexible_dates", Policy::one_of([true, false]))
        .draw("date_flexibility_days", Policy::int(3, 14))
        .draw("budget", Policy::int(40_000, 150_000))
        .draw(
            "budget_flexibility",
            Policy::one_of(["firm", "some_flexibility", "flexible"]),
        )
        .draw("location_preference", Policy::one_of(REQUEST_REGIONS.iter().copied()))
        .derive("location_requirements", location_requirements)
        .draw(
            "required_amenities",
            Policy::subset(REQUEST_AMENITIES.iter().copied(), 4, 6),
        )
        .draw(
            "preferred_amenities",
            Policy::subset(REQUEST_AMENITIES.iter().copied(), 2, 4),
        )
        .draw(
            "event_style",
            Policy::one_of(["in_person", "hybrid_in_person_virtual"]),
        )
        .draw(
            "special_requirements",
            Policy::subset(SPECIAL_REQUIREMENTS.iter().copied(), 2, 4),
        )
        .draw("past_events_with_us", Policy::int(0, 8))
        .draw(
            "client_preferences",
            Policy::subset(CLIENT_PREFERENCES.iter().copied(), 2, 4),
        );

    Ok(TableSpec::new("current_requests", 30, plan))
}
