//! Extraction over a complete results page.
//!
//! The fixture mirrors the layout of an Eventor "results by class" page:
//! a title with the event name, an organizer span, a date heading and one
//! header block plus result table per class.

use results_enricher::{
    extract_class_facts, extract_course_length, extract_date, extract_event_info,
    extract_position_facts, parse_rows_for_club, time_to_seconds, ClassFacts, PositionFacts,
};

const RESULT_PAGE: &str = r#"<!DOCTYPE html>
<html lang="sv">
<head>
  <meta charset="utf-8">
  <title>Resultat för Ravinträffen, medeldistans</title>
</head>
<body>
  <div id="main">
    <h1>Ravinträffen, medeldistans</h1>
    <h2>Söndag 14 april 2024</h2>
    <p>Arrangör: <span class="organiser">OK Ravinen</span></p>

    <div class="eventClassHeader"><div><h3>H21</h3>10 570 m, 66 startande</div></div>
    <table class="resultList">
      <tr><th>Plac</th><th>Namn</th><th>Klubb</th><th>Tid</th><th>Diff</th></tr>
      <tr><td>1</td><td>Erik Berg</td><td>OK Ravinen</td><td>1:05:30</td><td></td></tr>
      <tr><td>2</td><td>Jonas Ek</td><td>IFK Lidingö SOK</td><td>1:06:02</td><td>+0:32</td></tr>
    </table>

    <div class="eventClassHeader"><div><h3>Medelsvår 4 Dam</h3>4 160 m, 24 startande</div></div>
    <table class="resultList">
      <tr><th>Plac</th><th>Namn</th><th>Klubb</th><th>Tid</th><th>Diff</th></tr>
      <tr><td>1</td><td>Karin Sund</td><td>Järfälla OK</td><td>38:12</td><td></td></tr>
      <tr><td>7</td><td>Anna Lind</td><td>OK Ravinen</td><td>45:10</td><td>+6:58</td></tr>
    </table>

    <div class="eventClassHeader"><div><h3>Öppen 3</h3>2 900 m, 12 startande</div></div>
    <table class="resultList">
      <tr><th>Plac</th><th>Namn</th><th>Klubb</th><th>Tid</th></tr>
      <tr><td>1</td><td>Lars Åberg</td><td>Täby OK</td><td>29:45</td></tr>
    </table>
  </div>
</body>
</html>"#;

#[test]
fn test_every_class_on_the_page() {
    assert_eq!(
        extract_class_facts(RESULT_PAGE, "H21"),
        ClassFacts::new(10570, 66)
    );
    assert_eq!(
        extract_class_facts(RESULT_PAGE, "Medelsvår 4 Dam"),
        ClassFacts::new(4160, 24)
    );
    assert_eq!(
        extract_class_facts(RESULT_PAGE, "Öppen 3"),
        ClassFacts::new(2900, 12)
    );
}

#[test]
fn test_class_lookup_tolerates_spacing() {
    assert_eq!(
        extract_class_facts(RESULT_PAGE, "  Medelsvår   4 Dam "),
        ClassFacts::new(4160, 24)
    );
}

#[test]
fn test_missing_class_is_zero_not_a_neighbour() {
    assert_eq!(extract_class_facts(RESULT_PAGE, "H2"), ClassFacts::default());
    assert_eq!(extract_class_facts(RESULT_PAGE, "D21"), ClassFacts::default());
    assert_eq!(
        extract_class_facts(RESULT_PAGE, "Medelsvår 4 Herr"),
        ClassFacts::default()
    );
}

#[test]
fn test_event_header_fields() {
    let info = extract_event_info(RESULT_PAGE);
    assert_eq!(info.event_name, "Ravinträffen, medeldistans");
    assert_eq!(info.organizer.as_deref(), Some("OK Ravinen"));
    assert_eq!(extract_date(RESULT_PAGE), "2024-04-14");
}

#[test]
fn test_page_without_header_fields() {
    let html = "<html><head><title>Eventor</title></head><body></body></html>";
    let info = extract_event_info(html);
    assert_eq!(info.event_name, "Okänd tävling");
    assert_eq!(info.organizer, None);
    assert_eq!(extract_date(html), "");
}

#[test]
fn test_club_rows_across_classes() {
    let rows = parse_rows_for_club(RESULT_PAGE, "OK Ravinen");
    assert_eq!(rows.len(), 2);

    let erik = &rows[0];
    assert_eq!(erik.name, "Erik Berg");
    assert_eq!(erik.class_name, "H21");
    assert_eq!(erik.position, 1);
    assert_eq!(erik.length, 10570);
    assert_eq!(erik.total_participants, 66);
    assert_eq!(erik.time_in_seconds, 3930);
    assert_eq!(erik.event_name, "Ravinträffen, medeldistans");
    assert_eq!(erik.date, "2024-04-14");

    let anna = &rows[1];
    assert_eq!(anna.name, "Anna Lind");
    assert_eq!(anna.class_name, "Medelsvår 4 Dam");
    assert_eq!(anna.position, 7);
    assert_eq!(anna.length, 4160);
    assert_eq!(anna.total_participants, 24);
    assert_eq!(anna.time, "45:10");
    assert_eq!(anna.time_after_winner, "+6:58");
}

#[test]
fn test_free_text_helpers() {
    assert_eq!(extract_course_length("Banlängd 5,2 km"), 5200);
    assert_eq!(extract_course_length("10 570 m"), 10570);
    assert_eq!(extract_course_length("ingen bana"), 0);

    assert_eq!(
        extract_position_facts("12 (av 40)", None),
        PositionFacts::new(12, 40)
    );
    assert_eq!(extract_position_facts("Ej start", Some(10)), PositionFacts::default());

    assert_eq!(time_to_seconds("45:10"), 2710);
    assert_eq!(time_to_seconds("1:05:30"), 3930);
    assert_eq!(time_to_seconds("felst."), 0);
}
