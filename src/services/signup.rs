use std::borrow::Cow;
use std::str::FromStr;

use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::{ApiClient, AssociationRegistration, Registration, UserRegistration};
use crate::errors::ApiError;
use crate::models::UserType;
use crate::services::password::{validate_password, PasswordStrength};

pub const SUCCESS_MESSAGE: &str = "Account created! Redirecting to login...";
pub const FAILURE_FALLBACK: &str = "Registration failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Donor,
    Recipient,
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(AccountType::Donor),
            "recipient" => Ok(AccountType::Recipient),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonorKind {
    Individual,
    Organization,
}

impl FromStr for DonorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(DonorKind::Individual),
            "organization" => Ok(DonorKind::Organization),
            other => Err(format!("unknown donor kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Email,
    Password,
    ConfirmPassword,
    TermsAccepted,
    FirstName,
    LastName,
    OrganizationName,
    Phone,
    Address,
    Description,
}

impl FromStr for SignupField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(SignupField::Email),
            "password" => Ok(SignupField::Password),
            "confirm_password" => Ok(SignupField::ConfirmPassword),
            "terms_accepted" => Ok(SignupField::TermsAccepted),
            "first_name" => Ok(SignupField::FirstName),
            "last_name" => Ok(SignupField::LastName),
            "organization_name" => Ok(SignupField::OrganizationName),
            "phone" => Ok(SignupField::Phone),
            "address" => Ok(SignupField::Address),
            "description" => Ok(SignupField::Description),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

fn validate_terms(accepted: &bool) -> Result<(), ValidationError> {
    if *accepted {
        Ok(())
    } else {
        Err(ValidationError::new("terms")
            .with_message(Cow::Borrowed("You must accept the terms and conditions")))
    }
}

/// Schema for donor/individual and recipient accounts.
#[derive(Debug, Clone, Validate)]
pub struct PersonSignup {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,
    #[validate(custom(function = "validate_terms"))]
    pub terms_accepted: bool,
    #[validate(length(min = 2, message = "First name must be at least 2 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, message = "Last name must be at least 2 characters"))]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Schema for donor/organization accounts.
#[derive(Debug, Clone, Validate)]
pub struct OrganizationSignup {
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub confirm_password: String,
    #[validate(custom(function = "validate_terms"))]
    pub terms_accepted: bool,
    #[validate(length(min = 2, message = "Organization name is required"))]
    pub organization_name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SignupFields {
    email: String,
    password: String,
    confirm_password: String,
    terms_accepted: bool,
    first_name: String,
    last_name: String,
    organization_name: String,
    phone: String,
    address: String,
    description: String,
}

impl Default for SignupFields {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            terms_accepted: true,
            first_name: String::new(),
            last_name: String::new(),
            organization_name: String::new(),
            phone: String::new(),
            address: String::new(),
            description: String::new(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Signup form state. Every edit revalidates the schema selected by the
/// account type and donor kind.
#[derive(Debug, Clone)]
pub struct SignupForm {
    account_type: AccountType,
    donor_kind: DonorKind,
    fields: SignupFields,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self::new(AccountType::Donor, DonorKind::Individual)
    }
}

impl SignupForm {
    pub fn new(account_type: AccountType, donor_kind: DonorKind) -> Self {
        Self {
            account_type,
            donor_kind,
            fields: SignupFields::default(),
        }
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn donor_kind(&self) -> DonorKind {
        self.donor_kind
    }

    /// Switching account type resets every field.
    pub fn set_account_type(&mut self, account_type: AccountType) {
        if self.account_type != account_type {
            self.account_type = account_type;
            self.fields = SignupFields::default();
        }
    }

    /// Switching donor kind resets every field.
    pub fn set_donor_kind(&mut self, donor_kind: DonorKind) {
        if self.donor_kind != donor_kind {
            self.donor_kind = donor_kind;
            self.fields = SignupFields::default();
        }
    }

    fn is_organization(&self) -> bool {
        self.account_type == AccountType::Donor && self.donor_kind == DonorKind::Organization
    }

    /// Updates one field and returns the validation state of the whole form.
    pub fn set(&mut self, field: SignupField, value: &str) -> Result<(), ValidationErrors> {
        let f = &mut self.fields;
        match field {
            SignupField::Email => f.email = value.to_string(),
            SignupField::Password => f.password = value.to_string(),
            SignupField::ConfirmPassword => f.confirm_password = value.to_string(),
            SignupField::TermsAccepted => {
                f.terms_accepted = matches!(value, "true" | "yes" | "1" | "on")
            }
            SignupField::FirstName => f.first_name = value.to_string(),
            SignupField::LastName => f.last_name = value.to_string(),
            SignupField::OrganizationName => f.organization_name = value.to_string(),
            SignupField::Phone => f.phone = value.to_string(),
            SignupField::Address => f.address = value.to_string(),
            SignupField::Description => f.description = value.to_string(),
        }
        self.validate().map(|_| ())
    }

    pub fn password_strength(&self) -> PasswordStrength {
        PasswordStrength::of(&self.fields.password)
    }

    /// Validates against the selected schema and builds the payload for the
    /// matching endpoint.
    pub fn validate(&self) -> Result<Registration, ValidationErrors> {
        let f = &self.fields;

        if self.is_organization() {
            let schema = OrganizationSignup {
                email: f.email.clone(),
                password: f.password.clone(),
                confirm_password: f.confirm_password.clone(),
                terms_accepted: f.terms_accepted,
                organization_name: f.organization_name.clone(),
                phone: f.phone.clone(),
                address: f.address.clone(),
                description: non_empty(&f.description),
            };
            schema.validate()?;
            return Ok(Registration::Association(AssociationRegistration {
                name: schema.organization_name,
                email: schema.email,
                password: schema.password,
                phone: schema.phone,
                address: schema.address,
                description: schema.description,
            }));
        }

        let schema = PersonSignup {
            email: f.email.clone(),
            password: f.password.clone(),
            confirm_password: f.confirm_password.clone(),
            terms_accepted: f.terms_accepted,
            first_name: f.first_name.clone(),
            last_name: f.last_name.clone(),
            phone: non_empty(&f.phone),
            address: non_empty(&f.address),
        };
        schema.validate()?;

        let (user_type, password_confirmation) = match self.account_type {
            AccountType::Donor => (UserType::Donor, Some(schema.confirm_password)),
            AccountType::Recipient => (UserType::Recipient, None),
        };
        Ok(Registration::User(UserRegistration {
            first_name: schema.first_name,
            last_name: schema.last_name,
            email: schema.email,
            password: schema.password,
            password_confirmation,
            phone: schema.phone,
            address: schema.address,
            user_type,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl FormStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == StatusKind::Success
    }
}

/// Validates and posts the form. Failures never escape; they become the
/// message shown under the form.
pub async fn submit(form: &SignupForm, api: &ApiClient) -> FormStatus {
    let registration = match form.validate() {
        Ok(r) => r,
        Err(errors) => {
            return FormStatus::error(ApiError::Form(errors).user_message(FAILURE_FALLBACK));
        }
    };

    match api.register(&registration).await {
        Ok(_) => {
            tracing::info!(endpoint = registration.endpoint(), "account created");
            FormStatus::success(SUCCESS_MESSAGE)
        }
        Err(e) => {
            tracing::error!(error = %e, endpoint = registration.endpoint(), "registration failed");
            FormStatus::error(e.user_message(FAILURE_FALLBACK))
        }
    }
}
