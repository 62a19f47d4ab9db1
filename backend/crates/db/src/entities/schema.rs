//! Static column tables for the typed entity kinds.

use crate::entities::models::{FieldSpec, FieldType};

const fn field(sources: &'static [&'static str], column: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec {
        sources,
        column,
        ty,
    }
}

const CREATEDATE: FieldSpec = field(
    &["hubspot_createdate", "hs_createdate"],
    "hubspot_createdate",
    FieldType::Timestamp,
);
const LASTMODIFIEDDATE: FieldSpec = field(
    &["hubspot_lastmodifieddate", "hs_lastmodifieddate"],
    "hubspot_lastmodifieddate",
    FieldType::Timestamp,
);

pub const JOB_FIELDS: &[FieldSpec] = &[
    field(&["job_id"], "job_id", FieldType::Int),
    field(&["add_date"], "add_date", FieldType::Timestamp),
    field(&["add_user_id"], "add_user_id", FieldType::Int),
    field(&["cancel_date"], "cancel_date", FieldType::Date),
    field(&["contract_amount"], "contract_amount", FieldType::Float),
    field(&["job_value"], "job_value", FieldType::Float),
    field(&["hs_object_id"], "hs_object_id", FieldType::Int),
    CREATEDATE,
    LASTMODIFIEDDATE,
];

pub const DIVISION_FIELDS: &[FieldSpec] = &[
    field(&["id"], "id", FieldType::Int),
    field(&["abbreviation"], "abbreviation", FieldType::Text),
    field(&["group_id"], "group_id", FieldType::Int),
    field(&["is_corp"], "is_corp", FieldType::Int),
    field(&["is_inactive"], "is_inactive", FieldType::Int),
    field(&["hs_object_id"], "hs_object_id", FieldType::Int),
    CREATEDATE,
    LASTMODIFIEDDATE,
];

pub const EMPLOYEE_FIELDS: &[FieldSpec] = &[
    field(&["firstname"], "firstname", FieldType::Text),
    field(&["lastname"], "lastname", FieldType::Text),
    field(&["email"], "email", FieldType::Text),
    field(&["employee_division_id"], "employee_division_id", FieldType::Int),
    field(&["employee_title_id"], "employee_title_id", FieldType::Int),
    field(&["hs_object_id"], "hs_object_id", FieldType::Int),
    CREATEDATE,
    LASTMODIFIEDDATE,
];
