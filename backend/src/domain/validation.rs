//! Field validation rules guarding every identity write.
//!
//! Each function checks one field or one field group and reports the first
//! rule broken as a distinct violation. Nothing here performs I/O; callers
//! supply "now" or "today" so the rules stay deterministic.

mod area_codes;

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use secrecy::ExposeSecret;
use url::Url;

use super::identity::{
    AccountStatus, CredentialUpdate, LoginFailureFields, NewCredential, ProfileDetails,
};

pub use area_codes::is_known_area_code;

/// Maximum length of a first name, in characters.
pub const FIRST_NAME_MAX: usize = 20;
/// Maximum length of a last name, in characters.
pub const LAST_NAME_MAX: usize = 50;
/// Earliest accepted birth year.
pub const MIN_BIRTH_YEAR: i32 = 1900;
/// Minimum age, in whole years.
pub const MIN_AGE_YEARS: i32 = 13;
/// Minimum number of digits in a phone number.
pub const PHONE_DIGITS_MIN: usize = 9;
/// Maximum number of digits in a phone number.
pub const PHONE_DIGITS_MAX: usize = 14;
/// Minimum username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length.
pub const USERNAME_MAX: usize = 20;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX: usize = 64;
/// Characters satisfying the special-character password requirement.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Violations of the profile field rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileViolation {
    /// First name is not one capitalised word of letters.
    #[error("first name must be a single capitalised word of at most {FIRST_NAME_MAX} letters")]
    FirstName,
    /// Last name is not capitalised words separated by single spaces.
    #[error("last name must be capitalised words separated by single spaces")]
    LastName,
    /// Last name exceeds its length limit.
    #[error("last name must be at most {max} characters")]
    LastNameTooLong { max: usize },
    /// Email does not match the address grammar.
    #[error("email must be a valid address")]
    Email,
    /// Birth date is today or later.
    #[error("birth date must be in the past")]
    BirthDateNotInPast,
    /// Birth year outside the accepted range.
    #[error("birth year must be between {min} and {max}")]
    BirthYearOutOfRange { min: i32, max: i32 },
    /// Age below the minimum.
    #[error("user must be at least {min_age} years old, got {age}")]
    Underage { min_age: i32, age: i32 },
    /// Phone holds characters outside digits, '+', parentheses, space and hyphen.
    #[error("phone may only contain digits, '+', parentheses, spaces, and hyphens")]
    PhoneCharacters,
    /// Phone digit count outside bounds.
    #[error("phone must have between {min} and {max} digits, got {actual}")]
    PhoneDigitCount { min: usize, max: usize, actual: usize },
    /// Phone matches neither the international nor the domestic layout.
    #[error("phone must be '+' and a country code, or an area code followed by NNNN[N]-NNNN")]
    PhoneFormat,
    /// Domestic area code is not on the whitelist.
    #[error("unknown area code {code}")]
    UnknownAreaCode { code: String },
    /// Profile image is not an absolute http(s) URL.
    #[error("profile image must be an absolute http(s) URL")]
    ProfileImageUrl,
}

impl ProfileViolation {
    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name_format",
            Self::LastName => "last_name_format",
            Self::LastNameTooLong { .. } => "last_name_too_long",
            Self::Email => "email_format",
            Self::BirthDateNotInPast => "birth_date_not_in_past",
            Self::BirthYearOutOfRange { .. } => "birth_year_out_of_range",
            Self::Underage { .. } => "underage",
            Self::PhoneCharacters => "phone_characters",
            Self::PhoneDigitCount { .. } => "phone_digit_count",
            Self::PhoneFormat => "phone_format",
            Self::UnknownAreaCode { .. } => "unknown_area_code",
            Self::ProfileImageUrl => "profile_image_url",
        }
    }
}

/// Violations of the credential field rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialViolation {
    /// Username length outside bounds.
    #[error("username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },
    /// Username characters or separators are not allowed.
    #[error(
        "username must be alphanumeric runs separated by single '.', '-' or '_', \
         starting and ending with an alphanumeric character"
    )]
    UsernameFormat,
    /// Password length outside bounds.
    #[error("password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
    /// Password lacks a lowercase letter.
    #[error("password must contain a lowercase letter")]
    PasswordMissingLowercase,
    /// Password lacks an uppercase letter.
    #[error("password must contain an uppercase letter")]
    PasswordMissingUppercase,
    /// Password lacks a digit.
    #[error("password must contain a digit")]
    PasswordMissingDigit,
    /// Password lacks a special character.
    #[error("password must contain one of {PASSWORD_SPECIALS}")]
    PasswordMissingSpecial,
    /// Account status is not one of the enumerated values.
    #[error("unknown account status {value}")]
    UnknownAccountStatus { value: String },
    /// Non-active status without a reason.
    #[error("status {status} requires a status reason")]
    MissingStatusReason { status: AccountStatus },
}

impl CredentialViolation {
    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UsernameLength { .. } => "username_length",
            Self::UsernameFormat => "username_format",
            Self::PasswordLength { .. } => "password_length",
            Self::PasswordMissingLowercase => "password_missing_lowercase",
            Self::PasswordMissingUppercase => "password_missing_uppercase",
            Self::PasswordMissingDigit => "password_missing_digit",
            Self::PasswordMissingSpecial => "password_missing_special",
            Self::UnknownAccountStatus { .. } => "unknown_account_status",
            Self::MissingStatusReason { .. } => "missing_status_reason",
        }
    }
}

/// Violations of the login-failure bookkeeping rules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginFailureViolation {
    /// Last failed login lies after "now".
    #[error("last failed login must not be in the future")]
    LastFailedLoginInFuture,
    /// Attempt counter is negative.
    #[error("failed login attempts must not be negative, got {attempts}")]
    NegativeAttempts { attempts: i32 },
    /// Attempts recorded without a reason.
    #[error("a failed login reason is required when attempts are recorded")]
    MissingReason,
}

impl LoginFailureViolation {
    /// Stable machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::LastFailedLoginInFuture => "last_failed_login_in_future",
            Self::NegativeAttempts { .. } => "negative_failed_login_attempts",
            Self::MissingReason => "missing_failed_login_reason",
        }
    }
}

/// Any field-rule violation, grouped by the record it concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A profile field is invalid.
    #[error("invalid profile: {0}")]
    Profile(#[from] ProfileViolation),
    /// A credential field is invalid.
    #[error("invalid credential: {0}")]
    Credential(#[from] CredentialViolation),
    /// The login-failure fields are inconsistent.
    #[error("invalid login failure state: {0}")]
    LoginFailure(#[from] LoginFailureViolation),
}

impl ValidationError {
    /// Stable machine-readable code of the underlying violation.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Profile(violation) => violation.code(),
            Self::Credential(violation) => violation.code(),
            Self::LoginFailure(violation) => violation.code(),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|error| panic!("validation regex {pattern} failed to compile: {error}"))
}

static FIRST_NAME_RE: OnceLock<Regex> = OnceLock::new();
static LAST_NAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static INTERNATIONAL_PHONE_RE: OnceLock<Regex> = OnceLock::new();
static DOMESTIC_PHONE_RE: OnceLock<Regex> = OnceLock::new();
static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn first_name_regex() -> &'static Regex {
    // One uppercase letter followed by up to 19 letters of any case.
    FIRST_NAME_RE.get_or_init(|| compile(r"^\p{Lu}\p{L}{0,19}$"))
}

fn last_name_regex() -> &'static Regex {
    LAST_NAME_RE.get_or_init(|| compile(r"^\p{Lu}\p{L}*(?: \p{Lu}\p{L}*)*$"))
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| compile(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$"))
}

fn international_phone_regex() -> &'static Regex {
    INTERNATIONAL_PHONE_RE
        .get_or_init(|| compile(r"^\+\d{1,3} ?(?:\(\d{1,4}\) ?)?\d+(?:[ -]\d+)*$"))
}

fn domestic_phone_regex() -> &'static Regex {
    DOMESTIC_PHONE_RE.get_or_init(|| {
        compile(r"^(?:\((?P<paren>\d{2})\)|(?P<bare>\d{2})) ?\d{4,5}-\d{4}$")
    })
}

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| compile(r"^[A-Za-z0-9]+(?:[._-][A-Za-z0-9]+)*$"))
}

/// Validate every profile field, stopping at the first violation.
///
/// `today` anchors the birth-date and age rules.
pub fn validate_profile(details: &ProfileDetails, today: NaiveDate) -> Result<(), ProfileViolation> {
    validate_first_name(&details.first_name)?;
    validate_last_name(&details.last_name)?;
    validate_email(&details.email)?;
    validate_birth_date(details.birth_date, today)?;
    validate_phone(&details.phone)?;
    validate_profile_image_url(details.profile_image_url.as_deref())
}

/// First name: one capitalised word of letters, accented letters included.
pub fn validate_first_name(first_name: &str) -> Result<(), ProfileViolation> {
    if first_name_regex().is_match(first_name) {
        Ok(())
    } else {
        Err(ProfileViolation::FirstName)
    }
}

/// Last name: capitalised words separated by single spaces.
pub fn validate_last_name(last_name: &str) -> Result<(), ProfileViolation> {
    if last_name.chars().count() > LAST_NAME_MAX {
        return Err(ProfileViolation::LastNameTooLong { max: LAST_NAME_MAX });
    }
    if last_name_regex().is_match(last_name) {
        Ok(())
    } else {
        Err(ProfileViolation::LastName)
    }
}

/// Email: simplified `local@domain.tld` grammar.
pub fn validate_email(email: &str) -> Result<(), ProfileViolation> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ProfileViolation::Email)
    }
}

/// Age in whole years on `today`.
///
/// The birthday counts as reached only once its month and day have
/// occurred, so a 29 February birthday is reached on 1 March in common
/// years.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years - 1
    } else {
        years
    }
}

/// Birth date: strictly past, year within bounds, and old enough.
pub fn validate_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<(), ProfileViolation> {
    if birth_date >= today {
        return Err(ProfileViolation::BirthDateNotInPast);
    }
    let year = birth_date.year();
    if year < MIN_BIRTH_YEAR || year > today.year() {
        return Err(ProfileViolation::BirthYearOutOfRange {
            min: MIN_BIRTH_YEAR,
            max: today.year(),
        });
    }
    let age = age_on(birth_date, today);
    if age < MIN_AGE_YEARS {
        return Err(ProfileViolation::Underage {
            min_age: MIN_AGE_YEARS,
            age,
        });
    }
    Ok(())
}

fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | ' ' | '-')
}

/// Phone: international `+CC ...` or domestic `AA NNNN[N]-NNNN`.
///
/// Domestic numbers must use a whitelisted area code.
pub fn validate_phone(phone: &str) -> Result<(), ProfileViolation> {
    if phone.is_empty() || !phone.chars().all(is_phone_char) {
        return Err(ProfileViolation::PhoneCharacters);
    }

    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !(PHONE_DIGITS_MIN..=PHONE_DIGITS_MAX).contains(&digits) {
        return Err(ProfileViolation::PhoneDigitCount {
            min: PHONE_DIGITS_MIN,
            max: PHONE_DIGITS_MAX,
            actual: digits,
        });
    }

    if phone.starts_with('+') {
        return if international_phone_regex().is_match(phone) {
            Ok(())
        } else {
            Err(ProfileViolation::PhoneFormat)
        };
    }

    let captures = domestic_phone_regex()
        .captures(phone)
        .ok_or(ProfileViolation::PhoneFormat)?;
    let area_code = captures
        .name("paren")
        .or_else(|| captures.name("bare"))
        .map(|m| m.as_str())
        .ok_or(ProfileViolation::PhoneFormat)?;
    if is_known_area_code(area_code) {
        Ok(())
    } else {
        Err(ProfileViolation::UnknownAreaCode {
            code: area_code.to_owned(),
        })
    }
}

/// Profile image: absent, empty, or an absolute http(s) URL.
pub fn validate_profile_image_url(url: Option<&str>) -> Result<(), ProfileViolation> {
    let Some(raw) = url.filter(|value| !value.trim().is_empty()) else {
        return Ok(());
    };
    match Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(ProfileViolation::ProfileImageUrl),
    }
}

/// Validate the credential fields supplied at creation.
pub fn validate_new_credential(credential: &NewCredential) -> Result<(), CredentialViolation> {
    validate_username(&credential.username)?;
    validate_password(credential.password.expose_secret())?;
    validate_account_status(credential.account_status, &credential.status_reason)
}

/// Validate the credential fields supplied on update.
pub fn validate_credential_update(update: &CredentialUpdate) -> Result<(), CredentialViolation> {
    validate_username(&update.username)?;
    validate_account_status(update.account_status, &update.status_reason)
}

/// Username: 3-20 characters of alphanumeric runs joined by single separators.
pub fn validate_username(username: &str) -> Result<(), CredentialViolation> {
    let length = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
        return Err(CredentialViolation::UsernameLength {
            min: USERNAME_MIN,
            max: USERNAME_MAX,
        });
    }
    if username_regex().is_match(username) {
        Ok(())
    } else {
        Err(CredentialViolation::UsernameFormat)
    }
}

/// Password: 8-64 characters mixing lowercase, uppercase, digit, and special.
pub fn validate_password(password: &str) -> Result<(), CredentialViolation> {
    let length = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&length) {
        return Err(CredentialViolation::PasswordLength {
            min: PASSWORD_MIN,
            max: PASSWORD_MAX,
        });
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(CredentialViolation::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(CredentialViolation::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(CredentialViolation::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(CredentialViolation::PasswordMissingSpecial);
    }
    Ok(())
}

/// Status/reason coupling: any non-active status needs a reason.
pub fn validate_account_status(
    status: AccountStatus,
    reason: &str,
) -> Result<(), CredentialViolation> {
    if status.requires_reason() && reason.trim().is_empty() {
        return Err(CredentialViolation::MissingStatusReason { status });
    }
    Ok(())
}

/// Login-failure bookkeeping: not in the future, non-negative, explained.
pub fn validate_login_failure(
    fields: LoginFailureFields<'_>,
    now: DateTime<Utc>,
) -> Result<(), LoginFailureViolation> {
    if fields.last_failed_login.is_some_and(|at| at > now) {
        return Err(LoginFailureViolation::LastFailedLoginInFuture);
    }
    if fields.failed_login_attempts < 0 {
        return Err(LoginFailureViolation::NegativeAttempts {
            attempts: fields.failed_login_attempts,
        });
    }
    if fields.failed_login_attempts > 0 && fields.last_failed_login_reason.trim().is_empty() {
        return Err(LoginFailureViolation::MissingReason);
    }
    Ok(())
}
