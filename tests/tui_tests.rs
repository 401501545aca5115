use dupsift::actions::DeleteConfig;
use dupsift::duplicates::DuplicateGroup;
use dupsift::scanner::Digest;
use dupsift::tui::app::{Action, App};
use dupsift::tui::ui::{list_height, render};
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::PathBuf;

fn setup_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn make_group(seed: u8, size: u64, paths: &[&str]) -> DuplicateGroup {
    DuplicateGroup::new(
        Digest::from_bytes([seed; 32]),
        size,
        paths.iter().map(PathBuf::from).collect(),
    )
}

fn draw(terminal: &mut Terminal<TestBackend>, app: &mut App) -> Vec<String> {
    terminal
        .draw(|f| {
            app.set_visible_rows(list_height(f.area()));
            render(f, app);
        })
        .unwrap();

    let buffer = terminal.backend().buffer();
    let width = usize::from(buffer.area.width);
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect()
}

fn sample_app() -> App {
    App::new(
        vec![
            make_group(1, 10, &["/photos/a.jpg", "/backup/a.jpg"]),
            make_group(2, 1000, &["/music/x.mp3", "/music/y.mp3", "/old/x.mp3"]),
        ],
        DeleteConfig::permanent(),
    )
}

#[test]
fn test_render_tree_rows() {
    let mut terminal = setup_terminal(80, 24);
    let mut app = sample_app();
    let rows = draw(&mut terminal, &mut app);
    let screen = rows.join("\n");

    assert!(screen.contains("dupsift | 2 groups, 5 files"));
    assert!(screen.contains("3 files: 'x.mp3'"));
    assert!(screen.contains("2 files: 'a.jpg'"));
    assert!(screen.contains("/music/y.mp3"));
    assert!(screen.contains("Status: 0 files marked for deletion"));

    // Largest aggregate size first.
    let music = rows.iter().position(|r| r.contains("'x.mp3'")).unwrap();
    let photos = rows.iter().position(|r| r.contains("'a.jpg'")).unwrap();
    assert!(music < photos);
}

#[test]
fn test_render_marked_row() {
    let mut terminal = setup_terminal(80, 24);
    let mut app = sample_app();
    app.handle_action(Action::Down);
    app.handle_action(Action::ToggleMark);

    let screen = draw(&mut terminal, &mut app).join("\n");
    assert!(screen.contains("[DELETE] /music/x.mp3"));
    assert!(screen.contains("Status: 1 files marked for deletion"));
}

#[test]
fn test_render_confirm_dialog() {
    let mut terminal = setup_terminal(80, 24);
    let mut app = sample_app();
    app.handle_action(Action::Down);
    app.handle_action(Action::ToggleMark);
    app.handle_action(Action::Commit);

    let screen = draw(&mut terminal, &mut app).join("\n");
    assert!(screen.contains("Permanently delete 1 file(s)"));
}

#[test]
fn test_render_empty_tree() {
    let mut terminal = setup_terminal(80, 24);
    let mut app = App::new(Vec::new(), DeleteConfig::trash());

    let screen = draw(&mut terminal, &mut app).join("\n");
    assert!(screen.contains("No duplicates left."));
}

#[test]
fn test_scroll_follows_cursor() {
    let groups: Vec<DuplicateGroup> = (0..20u8)
        .map(|i| {
            let a = format!("/d/{i}/a");
            let b = format!("/d/{i}/b");
            make_group(i, u64::from(i) + 1, &[a.as_str(), b.as_str()])
        })
        .collect();
    let mut terminal = setup_terminal(80, 24);
    let mut app = App::new(groups, DeleteConfig::permanent());
    draw(&mut terminal, &mut app);

    app.handle_action(Action::Bottom);
    let rows = draw(&mut terminal, &mut app);

    assert_eq!(app.selected(), app.nodes().len() - 1);
    assert!(app.scroll_offset() > 0);
    // Smallest group is last; its second file is the bottom row.
    assert!(rows.iter().any(|r| r.contains("/d/0/b")));
    assert!(!rows.iter().any(|r| r.contains("/d/19/a")));
}
