use serde_json::json;

use form_spec::{
    FieldControl, QuestionDefinition, RawFieldValues, build_render_payload, compile,
    definition_json_schema, render_json_ui, render_text,
};

fn fixture() -> Vec<QuestionDefinition> {
    serde_json::from_value(json!([
        { "inputType": "text", "title": "Name", "description": "Jane Doe", "isRequired": true, "minLength": 3, "maxLength": 30 },
        { "inputType": "options", "title": "Plan", "description": "ignored", "isRequired": false, "options": [
            { "label": "free", "value": "free" },
            { "label": "pro", "value": "pro" }
        ] }
    ]))
    .expect("fixture should deserialize")
}

#[test]
fn payload_maps_questions_to_controls() {
    let payload = build_render_payload(&fixture(), None);
    assert_eq!(payload.fields.len(), 2);

    let name = &payload.fields[0];
    assert_eq!(name.name, "text-0");
    assert_eq!(name.control, FieldControl::TextInput);
    assert_eq!(name.placeholder.as_deref(), Some("Jane Doe"));
    assert!(name.required);

    let plan = &payload.fields[1];
    assert_eq!(plan.name, "select-1");
    assert_eq!(plan.control, FieldControl::Select);
    assert_eq!(plan.placeholder, None);
    assert_eq!(plan.options.len(), 2);
    assert_eq!(payload.schema["required"], json!(["text-0"]));
}

#[test]
fn errors_are_attached_to_their_fields() {
    let questions = fixture();
    let errors = compile(&questions)
        .validate(&RawFieldValues::new().with("select-1", "enterprise"))
        .expect_err("missing name and unknown plan");
    let payload = build_render_payload(&questions, Some(&errors));

    let ui = render_json_ui(&payload);
    assert_eq!(ui["fields"][0]["error"], "This field is required");
    assert_eq!(ui["fields"][1]["error"], "Invalid option selected");
    assert_eq!(ui["fields"][1]["options"][1]["value"], "pro");

    let text = render_text(&payload);
    assert!(text.contains("text-0 [text] Name (required)"));
    assert!(text.contains("options: free, pro"));
    assert!(text.contains("error: Invalid option selected"));
}

#[test]
fn empty_form_renders_a_notice() {
    let payload = build_render_payload(&[], None);
    assert!(render_text(&payload).contains("no questions"));
    assert_eq!(render_json_ui(&payload)["fields"], json!([]));
}

#[test]
fn definition_schema_lists_the_discriminator() {
    let schema = definition_json_schema();
    assert!(schema.to_string().contains("inputType"));
}
