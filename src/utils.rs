#[macro_export]
macro_rules! post_funcs {
    ( $( ( $func_name:ident, $url:expr, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[post($url)]
                async fn $func_name(
                    pool: web::Data<DbPool>,
                    info: web::Json<$request>
                ) -> impl Responder {
                    let response = match [<$func_name _impl>](pool, info).await {
                        Ok(response) => response,
                        Err(err) => {
                            tracing::warn!("{} failed: {}", stringify!($func_name), err);
                            $response::err(err.to_string())
                        }
                    };
                    HttpResponse::Ok().json(response)
                }
            }
        )+
    };
}

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FMT: &str = "%Y-%m-%d";
const SLOT_FMT: &str = "%H:%M";
// Time values coming back from the database carry seconds.
const SLOT_FMT_LONG: &str = "%H:%M:%S";

pub fn parse_date_str<S: AsRef<str>>(s: S) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.as_ref(), DATE_FMT).context("Invalid date format")
}

pub fn parse_date_str_opt<S: AsRef<str>>(s: Option<S>) -> anyhow::Result<Option<NaiveDate>> {
    s.map(parse_date_str).transpose()
}

pub fn parse_slot_str<S: AsRef<str>>(s: S) -> anyhow::Result<NaiveTime> {
    let s = s.as_ref();
    NaiveTime::parse_from_str(s, SLOT_FMT)
        .or_else(|_| NaiveTime::parse_from_str(s, SLOT_FMT_LONG))
        .context("Invalid time format")
}

pub fn parse_slot_str_opt<S: AsRef<str>>(s: Option<S>) -> anyhow::Result<Option<NaiveTime>> {
    s.map(parse_slot_str).transpose()
}

/// Inclusive date bounds for an optional exact-date filter; without a date
/// the sentinel pair covers every row.
pub fn get_date_pair_opt<S: AsRef<str>>(date: Option<S>) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    match date {
        Some(date) => {
            let date = parse_date_str(date)?;
            Ok((date, date))
        }
        None => Ok((
            NaiveDate::from_ymd(1901, 1, 1),
            NaiveDate::from_ymd(2901, 1, 1),
        )),
    }
}

pub fn format_date_str(date: &NaiveDate) -> String {
    format!("{}", date.format(DATE_FMT))
}

pub fn format_slot_str(time: &NaiveTime) -> String {
    format!("{}", time.format(SLOT_FMT))
}

pub fn format_time_str(time: &NaiveDateTime) -> String {
    const TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(TIME_FMT))
}

pub fn assert_name_str(name: &str) -> anyhow::Result<()> {
    let name = name.trim();
    if name.len() < 2 || name.len() > 50 {
        bail!("Name must be 2-50 characters");
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-' || c == '\'');
    if !valid {
        bail!("Name must contain only letters, spaces, hyphens, or apostrophes");
    }
    Ok(())
}

pub fn assert_phone_str(phone: &str) -> anyhow::Result<()> {
    let phone = phone.trim();
    if phone.len() < 10 || phone.len() > 20 {
        bail!("Please enter a valid phone number (10-20 digits)");
    }
    let valid = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'));
    if !valid {
        bail!("Please enter a valid phone number (10-20 digits)");
    }
    Ok(())
}

/// Strips markup-significant characters from free text before storage.
pub fn sanitize_input(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '&' | '"' | '\''))
        .collect()
}
