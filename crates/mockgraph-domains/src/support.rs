//! Field helpers shared by the domain catalogs.

use chrono::NaiveDate;
use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName};
use fake::faker::company::en::{CatchPhrase, CompanyName};

use mockgraph_generate::{GenerationError, RecordDraft, Result, Sampler, Value};

pub fn company_name(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let name: String = CompanyName().fake_with_rng(sampler.rng());
    Ok(Value::Text(name))
}

pub fn catch_phrase(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let phrase: String = CatchPhrase().fake_with_rng(sampler.rng());
    Ok(Value::Text(phrase))
}

pub fn city_name(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let city: String = CityName().fake_with_rng(sampler.rng());
    Ok(Value::Text(city))
}

pub fn state_abbr(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let state: String = StateAbbr().fake_with_rng(sampler.rng());
    Ok(Value::Text(state))
}

pub fn street_address(_: &RecordDraft<'_>, sampler: &mut Sampler) -> Result<Value> {
    let number: String = BuildingNumber().fake_with_rng(sampler.rng());
    let street: String = StreetName().fake_with_rng(sampler.rng());
    Ok(Value::Text(format!("{number} {street}")))
}

/// Company name followed by a suffix drawn from `suffixes`.
pub fn company_with_suffix(
    suffixes: &'static [&'static str],
) -> impl Fn(&RecordDraft<'_>, &mut Sampler) -> Result<Value> + Send + Sync + 'static {
    move |_, sampler| {
        let name: String = CompanyName().fake_with_rng(sampler.rng());
        let suffix = sampler.one(suffixes)?;
        Ok(Value::Text(format!("{name} {suffix}")))
    }
}

/// ISO date string for a calendar day.
pub fn iso_date(year: i64, month: i64, day: u32) -> Result<String> {
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .and_then(|(year, month)| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| {
            GenerationError::InvalidRange(format!("no such date {year}-{month}-{day}"))
        })?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// `corporate_conference` -> `Corporate Conference`.
pub fn title_case(label: &str) -> String {
    label
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
