//! Field tables for the Simplesat resources

use crate::schema::{Field, FieldType};

// ============================================================================
// Shared shapes
// ============================================================================

const STRING: FieldType = FieldType::String;

const SURVEY_REF: &[Field] = &[Field::integer("id"), Field::string("name")];

const QUESTION_REF: &[Field] = &[
    Field::integer("id"),
    Field::string("text"),
    Field::string("metric"),
];

const CUSTOM_ATTRIBUTES: &[Field] = &[Field::string("custom_attribute")];

// ============================================================================
// answers
// ============================================================================

pub const ANSWER_FIELDS: &[Field] = &[
    Field::integer("id").required(),
    Field::string("choice"),
    Field::string("choice_label"),
    Field::string("choices"),
    Field::string("comment"),
    Field::string("follow_up_answer"),
    Field::string("follow_up_answer_choice"),
    Field::string("follow_up_answer_choices"),
    Field::boolean("published_as_testimonial"),
    Field::datetime("created"),
    Field::datetime("modified"),
    Field::object("question", QUESTION_REF),
    Field::string("sentiment"),
    Field::object("survey", SURVEY_REF),
    Field::integer("response_id"),
];

// ============================================================================
// questions
// ============================================================================

const RULE_QUESTION: &[Field] = &[
    Field::integer("id"),
    Field::string("text"),
    Field::boolean("required"),
    Field::array("choices", &STRING),
    Field::array("rules", &STRING),
];

const RULE_FIELDS: &[Field] = &[
    Field::array("conditions", &STRING),
    Field::string("action"),
    Field::object("question", RULE_QUESTION),
];

const RULE: FieldType = FieldType::Object {
    fields: RULE_FIELDS,
    additional: false,
};

pub const QUESTION_FIELDS: &[Field] = &[
    Field::integer("id").required(),
    Field::object("survey", SURVEY_REF),
    Field::integer("order"),
    Field::string("metric"),
    Field::string("text"),
    Field::boolean("rating_scale"),
    Field::boolean("required"),
    Field::array("choices", &STRING),
    Field::array("rules", &RULE),
];

// ============================================================================
// responses
// ============================================================================

const TICKET: &[Field] = &[
    Field::integer("id"),
    Field::string("external_id"),
    Field::string("subject"),
    Field::open_object("custom_attributes", CUSTOM_ATTRIBUTES),
];

const TEAM_MEMBER_FIELDS: &[Field] = &[
    Field::string("email"),
    Field::string("external_id"),
    Field::integer("id"),
    Field::boolean("is_primary"),
    Field::string("name"),
    Field::string("role"),
];

const TEAM_MEMBER: FieldType = FieldType::Object {
    fields: TEAM_MEMBER_FIELDS,
    additional: false,
};

const CUSTOMER: &[Field] = &[
    Field::integer("id"),
    Field::string("external_id"),
    Field::string("name"),
    Field::string("email"),
    Field::string("company"),
    Field::array("tags", &STRING),
    Field::open_object("custom_attributes", CUSTOM_ATTRIBUTES),
];

const RESPONSE_ANSWER_FIELDS: &[Field] = &[
    Field::integer("id"),
    Field::object("question", QUESTION_REF),
    Field::string("choice"),
    Field::string("choices"),
    Field::string("comment"),
    Field::string("sentiment"),
    Field::string("follow_up_answer"),
    Field::string("choice_label"),
    Field::string("follow_up_answer_choice"),
    Field::string("follow_up_answer_choices"),
    Field::object("follow_up_question", QUESTION_REF),
];

const RESPONSE_ANSWER: FieldType = FieldType::Object {
    fields: RESPONSE_ANSWER_FIELDS,
    additional: false,
};

pub const RESPONSE_FIELDS: &[Field] = &[
    Field::integer("id").required(),
    Field::object("survey", SURVEY_REF),
    Field::array("tags", &STRING),
    Field::datetime("created"),
    Field::datetime("modified"),
    Field::object("ticket", TICKET),
    Field::array("team_members", &TEAM_MEMBER),
    Field::object("customer", CUSTOMER),
    Field::array("answers", &RESPONSE_ANSWER),
];

// ============================================================================
// surveys
// ============================================================================

pub const SURVEY_FIELDS: &[Field] = &[
    Field::integer("id").required(),
    Field::string("name"),
    Field::string("metric"),
];
