use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use quiz_core::model::{Answer, QuestionBody, QuestionType, QuizMode, SourceId, UnitName};
use quiz_core::time::fixed_clock;
use quiz_core::{Reveal, Verdict};
use services::{
    Advance, QuizConfig, QuizController, QuizError, SessionPhase, StartOutcome, UnitEntry,
};
use storage::{InMemorySource, QuestionSource, SourceError};

const HEART: &str = r#"{"type":"mcq","stem":"Which node fires first?","choices":["AV","SA","His"],"answer":1}
{"type":"mcq","stem":"Largest chamber?","choices":["LV","RA","RV"],"answer":0}
{"type":"mcq","stem":"Valve between LA and LV?","choices":["tricuspid","pulmonary","mitral"],"answer":2}
"#;

const NERVOUS: &str = r#"{"type":"open","stem":"Describe a reflex arc","key_points":["receptor","sensory neuron","effector"]}

{"type":"mcq","stem":"Myelin is produced by?","choices":["Schwann cells","neurons"],"answer":0}
"#;

const CHAINS: &str = r#"{"unit":"Heart","type":"chain","stem":"Order the blood flow","steps":["RA","RV","lungs"],"correct_order":[0,1,2]}
{"type":"chain","stem":"No unit","steps":["a","b"],"correct_order":[1,0]}
"#;

fn id(raw: &str) -> SourceId {
    SourceId::new(raw).unwrap()
}

fn unit(name: &str) -> UnitName {
    UnitName::new(name).unwrap()
}

fn source() -> InMemorySource {
    let source = InMemorySource::new();
    source.insert(id("heart.jsonl"), HEART);
    source.insert(id("nervous.jsonl"), NERVOUS);
    source.insert(id("chains.jsonl"), CHAINS);
    source
}

/// Holds every fetch until released.
struct GatedSource {
    inner: InMemorySource,
    gate: Arc<Notify>,
}

#[async_trait]
impl QuestionSource for GatedSource {
    async fn fetch(&self, source_id: &SourceId) -> Result<String, SourceError> {
        self.gate.notified().await;
        self.inner.fetch(source_id).await
    }
}

fn config() -> QuizConfig {
    QuizConfig::new(
        "data",
        vec![
            UnitEntry::new(unit("Heart"), id("heart.jsonl")),
            UnitEntry::new(unit("Nervous"), id("nervous.jsonl")),
        ],
        Some(id("chains.jsonl")),
    )
    .unwrap()
}

fn controller(source: &InMemorySource) -> QuizController {
    QuizController::new(config(), Arc::new(source.clone()))
        .with_clock(fixed_clock())
        .with_seed(42)
}

#[tokio::test]
async fn heart_mcq_session_grades_each_choice() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart"]).unwrap();
    quiz.set_mode(QuizMode::Mcq);
    quiz.set_count(Some(10));

    let outcome = quiz.start_session().await.unwrap();
    assert_eq!(
        outcome,
        StartOutcome::Started {
            total: 3,
            matching: 3
        }
    );

    let mut seen_answer_one = false;
    loop {
        let view = quiz.current().unwrap();
        assert_eq!(view.question.kind(), QuestionType::Mcq);
        let QuestionBody::Mcq { answer, .. } = view.question.body() else {
            panic!("expected mcq");
        };
        let answer = *answer;

        if answer == 1 {
            seen_answer_one = true;
            assert_eq!(
                quiz.submit_answer(&Answer::Choice(1)).unwrap().verdict,
                Verdict::Correct
            );
            let regraded = quiz.submit_answer(&Answer::Choice(0)).unwrap();
            assert_eq!(regraded.verdict, Verdict::Incorrect);
            assert_eq!(regraded.reveal, Reveal::Choice(1));
        } else {
            quiz.choose(answer).unwrap();
            assert_eq!(quiz.submit_selection().unwrap().verdict, Verdict::Correct);
        }

        match quiz.advance().unwrap() {
            Advance::Next(_) => continue,
            Advance::Completed => break,
            other => panic!("unexpected advance: {other:?}"),
        }
    }

    assert!(seen_answer_one);
    assert_eq!(quiz.phase(), SessionPhase::Complete);
    assert_eq!(quiz.advance().unwrap(), Advance::AlreadyComplete);

    let summary = quiz.summary().unwrap();
    assert_eq!(summary.total_questions(), 3);
    assert_eq!(summary.correct(), 2);
    assert_eq!(summary.incorrect(), 1);
}

#[tokio::test]
async fn no_chain_questions_for_nervous_is_not_an_error() {
    let mut quiz = controller(&source());
    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Chain);
    quiz.set_count(Some(5));

    let outcome = quiz.start_session().await.unwrap();

    assert_eq!(outcome, StartOutcome::NoQuestionsMatched);
    assert_eq!(quiz.phase(), SessionPhase::NotStarted);
    assert!(quiz.current().is_none());
}

#[tokio::test]
async fn mixed_session_includes_routed_chain_questions() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart", "Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Mixed);

    let outcome = quiz.start_session().await.unwrap();
    assert_eq!(
        outcome,
        StartOutcome::Started {
            total: 6,
            matching: 6
        }
    );

    let kinds: Vec<_> = quiz
        .session()
        .unwrap()
        .questions()
        .iter()
        .map(|q| q.kind())
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == QuestionType::Chain).count(), 1);
    assert_eq!(kinds.iter().filter(|k| **k == QuestionType::Open).count(), 1);
    assert_eq!(quiz.bank().questions(&unit("Heart")).len(), 4);
}

#[tokio::test]
async fn session_length_is_min_of_count_and_matching() {
    let source = source();
    for (count, expected) in [(1, 1), (2, 2), (3, 3), (4, 4), (50, 4)] {
        let mut quiz = controller(&source);
        quiz.select_units(["Heart"]).unwrap();
        quiz.set_count(Some(count));

        let outcome = quiz.start_session().await.unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Started {
                total: expected,
                matching: 4
            }
        );
    }
}

#[tokio::test]
async fn chain_answers_need_exact_order() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart"]).unwrap();
    quiz.set_mode(QuizMode::Chain);
    quiz.start_session().await.unwrap();

    for step in [1, 0, 2] {
        quiz.pick_step(step).unwrap();
    }
    assert_eq!(quiz.submit_selection().unwrap().verdict, Verdict::Incorrect);

    quiz.clear_steps().unwrap();
    for step in [0, 1, 2] {
        quiz.pick_step(step).unwrap();
    }
    let feedback = quiz.submit_selection().unwrap();
    assert_eq!(feedback.verdict, Verdict::Correct);
    assert_eq!(feedback.reveal, Reveal::Order(vec![0, 1, 2]));
}

#[tokio::test]
async fn open_questions_are_acknowledged_with_key_points() {
    let mut quiz = controller(&source());
    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Open);
    quiz.start_session().await.unwrap();

    assert_eq!(quiz.advance().unwrap(), Advance::NotAnswered);
    let feedback = quiz.submit_selection().unwrap();
    assert_eq!(feedback.verdict, Verdict::Submitted);
    assert!(matches!(feedback.reveal, Reveal::KeyPoints(ref points) if points.len() == 3));
    assert_eq!(quiz.advance().unwrap(), Advance::Completed);
}

#[tokio::test]
async fn no_selection_fails_before_any_fetch() {
    let source = source();
    let mut quiz = controller(&source);

    let err = quiz.start_session().await.unwrap_err();

    assert!(matches!(err, QuizError::NoUnitsSelected));
    assert!(source.fetched().is_empty());
}

#[tokio::test]
async fn malformed_line_aborts_load_and_keeps_prior_state() {
    let source = source();
    let mut quiz = controller(&source);
    quiz.select_units(["Heart"]).unwrap();
    quiz.set_mode(QuizMode::Mcq);
    quiz.start_session().await.unwrap();
    let previous_token = quiz.session().unwrap().token();

    source.insert(
        id("nervous.jsonl"),
        "{\"type\":\"open\",\"stem\":\"fine\"}\n{\"type\":\"mcq\",\"stem\":",
    );
    quiz.select_units(["Nervous"]).unwrap();
    let err = quiz.start_session().await.unwrap_err();

    assert!(err.is_malformed());
    match err {
        QuizError::Source(SourceError::MalformedRecord {
            source_id, line, ..
        }) => {
            assert_eq!(source_id, id("nervous.jsonl"));
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(quiz.session().unwrap().token(), previous_token);
    assert!(!quiz.bank().contains_unit(&unit("Nervous")));
    assert_eq!(quiz.bank().questions(&unit("Heart")).len(), 4);
}

#[tokio::test]
async fn unavailable_source_aborts_load() {
    let source = source();
    source.fail(id("chains.jsonl"));
    let mut quiz = controller(&source);
    quiz.select_units(["Heart"]).unwrap();

    let err = quiz.start_session().await.unwrap_err();

    assert!(err.is_source_unavailable());
    assert_eq!(quiz.phase(), SessionPhase::NotStarted);
    assert!(quiz.bank().is_empty());
}

#[tokio::test]
async fn new_start_replaces_completed_session() {
    let mut quiz = controller(&source());
    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Open);
    quiz.start_session().await.unwrap();
    quiz.submit_answer(&Answer::Reveal).unwrap();
    assert_eq!(quiz.advance().unwrap(), Advance::Completed);

    quiz.set_mode(QuizMode::Mcq);
    quiz.start_session().await.unwrap();

    assert_eq!(
        quiz.phase(),
        SessionPhase::InProgress {
            index: 0,
            answered: false
        }
    );
    assert_eq!(quiz.session().unwrap().mode(), QuizMode::Mcq);
}

#[tokio::test]
async fn stale_loads_are_discarded() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart"]).unwrap();
    let first = quiz.begin_start().unwrap();

    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Open);
    let second = quiz.begin_start().unwrap();
    assert!(second.token() > first.token());

    let first_loaded = tokio::spawn(first.run()).await.unwrap();
    let second_loaded = tokio::spawn(second.run()).await.unwrap();

    assert_eq!(
        quiz.finish_start(second_loaded).unwrap(),
        StartOutcome::Started {
            total: 1,
            matching: 1
        }
    );
    assert_eq!(
        quiz.finish_start(first_loaded).unwrap(),
        StartOutcome::Discarded
    );
    assert_eq!(quiz.session().unwrap().questions()[0].unit(), &unit("Nervous"));
}

#[tokio::test]
async fn in_flight_start_keeps_settings_it_was_issued_with() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart"]).unwrap();
    quiz.set_mode(QuizMode::Mcq);
    quiz.set_count(Some(10));
    let pending = quiz.begin_start().unwrap();

    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Open);
    quiz.set_count(Some(1));

    let outcome = quiz.finish_start(pending.run().await).unwrap();

    assert_eq!(
        outcome,
        StartOutcome::Started {
            total: 3,
            matching: 3
        }
    );
    let session = quiz.session().unwrap();
    assert_eq!(session.mode(), QuizMode::Mcq);
    assert!(session.questions().iter().all(|q| q.unit() == &unit("Heart")));
    assert_eq!(quiz.selected_units(), &[unit("Nervous")]);
    assert_eq!(quiz.mode(), QuizMode::Open);
}

#[tokio::test]
async fn reset_discards_session_and_in_flight_loads() {
    let mut quiz = controller(&source());
    quiz.select_units(["Heart"]).unwrap();
    quiz.start_session().await.unwrap();

    let pending = quiz.begin_start().unwrap();
    quiz.reset_session();
    assert_eq!(quiz.phase(), SessionPhase::NotStarted);

    let loaded = pending.run().await;
    assert_eq!(quiz.finish_start(loaded).unwrap(), StartOutcome::Discarded);
    assert_eq!(quiz.phase(), SessionPhase::NotStarted);
}

#[tokio::test]
async fn current_session_stays_usable_while_a_load_is_in_flight() {
    let gate = Arc::new(Notify::new());
    let gated = GatedSource {
        inner: source(),
        gate: Arc::clone(&gate),
    };
    let mut quiz = QuizController::new(config(), Arc::new(gated))
        .with_clock(fixed_clock())
        .with_seed(3);
    quiz.select_units(["Nervous"]).unwrap();
    quiz.set_mode(QuizMode::Open);

    let first = tokio::spawn(quiz.begin_start().unwrap().run());
    gate.notify_waiters();
    while !first.is_finished() {
        gate.notify_waiters();
        tokio::task::yield_now().await;
    }
    quiz.finish_start(first.await.unwrap()).unwrap();
    let running = quiz.session().unwrap().token();

    quiz.select_units(["Heart"]).unwrap();
    quiz.set_mode(QuizMode::Mcq);
    let second = tokio::spawn(quiz.begin_start().unwrap().run());

    assert_eq!(
        quiz.submit_answer(&Answer::Reveal).unwrap().verdict,
        Verdict::Submitted
    );
    assert_eq!(quiz.session().unwrap().token(), running);

    while !second.is_finished() {
        gate.notify_waiters();
        tokio::task::yield_now().await;
    }
    let outcome = quiz.finish_start(second.await.unwrap()).unwrap();

    assert_eq!(
        outcome,
        StartOutcome::Started {
            total: 3,
            matching: 3
        }
    );
    assert_eq!(quiz.session().unwrap().mode(), QuizMode::Mcq);
}
