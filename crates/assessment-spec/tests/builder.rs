use assessment_spec::{
    Assessment, AssessmentBuilder, DocumentError, QuestionPatch, QuestionType, SectionPatch,
};

fn fixture() -> Assessment {
    serde_json::from_str(include_str!("fixtures/backend_assessment.json")).expect("deserialize")
}

#[test]
fn adding_expands_the_new_item() {
    let mut builder = AssessmentBuilder::new(Assessment::new("job_1", "Backend"));
    let section_id = builder.add_section();
    assert_eq!(builder.expanded_section(), Some(section_id.as_str()));

    let question_id = builder.add_question(&section_id).expect("add question");
    assert_eq!(builder.expanded_question(), Some(question_id.as_str()));

    builder.toggle_question(&question_id);
    assert_eq!(builder.expanded_question(), None);
    builder.toggle_section(&section_id);
    assert_eq!(builder.expanded_section(), None);
    builder.toggle_section(&section_id);
    assert_eq!(builder.expanded_section(), Some(section_id.as_str()));
}

#[test]
fn deleting_expanded_items_collapses_them() {
    let mut builder = AssessmentBuilder::new(Assessment::new("job_1", "Backend"));
    let section_id = builder.add_section();
    builder.add_question(&section_id).expect("add question");
    builder.delete_section(&section_id).expect("delete");
    assert_eq!(builder.expanded_section(), None);
    assert_eq!(builder.expanded_question(), None);
    assert!(builder.document().sections.is_empty());
}

#[test]
fn undo_and_redo_walk_history() {
    let original = fixture();
    let mut builder = AssessmentBuilder::new(original.clone());
    assert!(!builder.is_dirty());
    assert!(!builder.can_undo());

    builder
        .update_section("section_1_1", &SectionPatch::default().title("Skills"))
        .expect("rename");
    builder.reorder_sections(0, 1).expect("reorder");
    assert!(builder.is_dirty());

    assert!(builder.undo());
    assert_eq!(builder.document().sections[0].title, "Skills");
    assert!(builder.undo());
    assert_eq!(builder.document(), &original);
    assert!(!builder.is_dirty());
    assert!(!builder.undo());

    assert!(builder.redo());
    assert_eq!(builder.document().sections[0].title, "Skills");
    builder.set_details("Renamed", None);
    assert!(!builder.can_redo(), "a new edit drops the redo branch");
}

#[test]
fn failed_operations_leave_document_and_history_untouched() {
    let mut builder = AssessmentBuilder::new(fixture());
    let before = builder.document().clone();
    assert_eq!(
        builder.update_question("section_1_1", "q_404", &QuestionPatch::default().required(true)),
        Err(DocumentError::QuestionNotFound {
            section_id: "section_1_1".into(),
            question_id: "q_404".into()
        })
    );
    assert_eq!(builder.document(), &before);
    assert!(!builder.can_undo());
}

#[test]
fn option_editing_goes_through_history() {
    let mut builder = AssessmentBuilder::new(Assessment::new("job_1", "Backend"));
    let section_id = builder.add_section();
    let question_id = builder.add_question(&section_id).expect("question");
    builder
        .update_question(
            &section_id,
            &question_id,
            &QuestionPatch::default()
                .kind(QuestionType::SingleChoice)
                .title("Remote?"),
        )
        .expect("switch kind");
    builder.add_option(&section_id, &question_id, "Yes").expect("yes");
    builder.add_option(&section_id, &question_id, "No").expect("no");
    builder.remove_option(&section_id, &question_id, 0).expect("remove");
    assert_eq!(
        builder.document().find_question(&question_id).expect("q").choices(),
        ["No".to_string()]
    );
    assert!(builder.undo());
    assert_eq!(
        builder.document().find_question(&question_id).expect("q").choices().len(),
        2
    );
}

#[test]
fn mark_saved_resets_change_detection() {
    let mut builder = AssessmentBuilder::new(Assessment::new("job_1", "Backend"));
    builder.add_section();
    assert!(builder.is_dirty());

    let mut stored = builder.document().clone();
    stored.id = "assessment_42".into();
    builder.mark_saved(stored);
    assert!(!builder.is_dirty());
    assert_eq!(builder.document().id, "assessment_42");
}

#[test]
fn loading_normalizes_stale_orders() {
    let mut doc = fixture();
    doc.sections[0].order = 9;
    doc.sections[1].questions[0].order = 0;
    let builder = AssessmentBuilder::new(doc);
    assert_eq!(builder.document().sections[0].order, 1);
    assert_eq!(builder.document().sections[1].questions[0].order, 1);
}
