use crate::tui::SessionBanner;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use wacore::browser::BrowserViewModel;
use wacore::chat_list::ChatListEntry;

const HELP: &str = "↑/↓ move  PgUp/PgDn page  g/G first/last  q quit";

pub fn draw(frame: &mut Frame, model: &BrowserViewModel, banner: &SessionBanner) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_title(frame, rows[0], model, banner);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(model.layout().list_width),
            Constraint::Min(0),
        ])
        .split(rows[1]);

    draw_chat_list(frame, panes[0], model);
    draw_transcript(frame, panes[1], model);
    draw_status(frame, rows[2], banner);
}

fn draw_title(frame: &mut Frame, area: Rect, model: &BrowserViewModel, banner: &SessionBanner) {
    let title = Line::from(vec![
        Span::styled(
            " WhatsApp ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} chats ", model.directory().len())),
        Span::styled(
            format!("via {}", banner.source),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn draw_chat_list(frame: &mut Frame, area: Rect, model: &BrowserViewModel) {
    let name_width = model.layout().name_width();
    let window = model.window();

    let items: Vec<ListItem> = model
        .visible_entries()
        .iter()
        .enumerate()
        .map(|(row, entry)| {
            let selected = row == window.cursor_in_view;
            let marker = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else if entry.is_group() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(
                format!("{marker}{}", truncate(&entry.name, name_width)),
                style,
            )))
        })
        .collect();

    let title = if model.directory().is_empty() {
        " Chats ".to_string()
    } else {
        format!(" Chats {}/{} ", model.cursor() + 1, model.directory().len())
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn draw_transcript(frame: &mut Frame, area: Rect, model: &BrowserViewModel) {
    let title = match model.selected() {
        Some(entry) => transcript_title(model, entry),
        None => " No chats ".to_string(),
    };

    let lines: Vec<Line> = if model.transcript().is_empty() {
        vec![Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        model
            .visible_transcript()
            .iter()
            .map(|line| Line::from(line.to_string()))
            .collect()
    };

    let transcript =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(transcript, area);
}

fn transcript_title(model: &BrowserViewModel, entry: &ChatListEntry) -> String {
    match model.directory().group(&entry.jid) {
        Some(group) if !group.participants.is_empty() => format!(
            " {} ({} members, {} admins) ",
            entry.name,
            group.participants.len(),
            group.admins().count()
        ),
        _ => format!(" {} ", entry.name),
    }
}

fn draw_status(frame: &mut Frame, area: Rect, banner: &SessionBanner) {
    let mut spans = Vec::new();
    if banner.partial {
        spans.push(Span::styled(
            "[partial snapshot] ",
            Style::default().fg(Color::Yellow),
        ));
    }
    if banner.skipped > 0 {
        spans.push(Span::styled(
            format!("[{} frames skipped] ", banner.skipped),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(HELP, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    match width {
        0 => String::new(),
        _ => {
            let mut out: String = name.chars().take(width - 1).collect();
            out.push('~');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use wacore::browser::BrowserMsg;
    use wacore::chat_buffer::{ChatBufferStore, ChatLine};
    use wacore::chat_list::ChatDirectory;
    use wacore::types::{ContactRecord, GroupParticipant, GroupRecord, Jid};

    fn render(model: &BrowserViewModel, banner: &SessionBanner) -> Vec<String> {
        let layout = model.layout();
        let backend = TestBackend::new(layout.width, layout.height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, model, banner)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn model(n: usize, width: u16, height: u16) -> BrowserViewModel {
        let contacts = (0..n)
            .map(|i| ContactRecord::new(Jid::user(&format!("{i}")), format!("Contact {i:02}")))
            .collect();
        let mut model = BrowserViewModel::new(
            ChatDirectory::new(contacts, vec![]),
            Arc::new(ChatBufferStore::new()),
        );
        model.update(BrowserMsg::Resize { width, height });
        model
    }

    #[test]
    fn test_list_shows_only_window_rows() {
        let mut model = model(30, 80, 12);
        for _ in 0..15 {
            model.update(BrowserMsg::MoveDown);
        }
        let screen = render(&model, &SessionBanner::new("test"));

        // The transcript title repeats the selected name on the border row.
        let listed: Vec<&String> = screen
            .iter()
            .filter(|row| row.starts_with('│') && row.contains("Contact "))
            .collect();
        assert_eq!(listed.len(), 8);
        assert!(screen.iter().any(|row| row.contains("> Contact 15")));
        assert!(!screen.iter().any(|row| row.contains("Contact 10")));
        assert!(screen[0].contains("30 chats"));
    }

    #[test]
    fn test_status_flags_partial_snapshot() {
        let model = model(2, 80, 10);
        let banner = SessionBanner {
            source: "127.0.0.1:8080".into(),
            partial: true,
            skipped: 3,
        };
        let screen = render(&model, &banner);

        let status = screen.last().unwrap();
        assert!(status.contains("[partial snapshot]"));
        assert!(status.contains("[3 frames skipped]"));
    }

    #[test]
    fn test_transcript_and_group_title() {
        let store = Arc::new(ChatBufferStore::new());
        let group_jid = Jid::group("10");
        store.append_line(&group_jid, ChatLine::new("Ana", "bom dia"));

        let mut group = GroupRecord::new(group_jid, "Amigos");
        group.participants = vec![
            GroupParticipant {
                jid: Jid::user("1"),
                is_admin: true,
                is_super_admin: false,
            },
            GroupParticipant {
                jid: Jid::user("2"),
                is_admin: false,
                is_super_admin: false,
            },
        ];
        let mut model = BrowserViewModel::new(ChatDirectory::new(vec![], vec![group]), store);
        model.update(BrowserMsg::Resize {
            width: 80,
            height: 10,
        });

        let screen = render(&model, &SessionBanner::new("local"));
        assert!(screen.iter().any(|row| row.contains("Amigos (2 members, 1 admins)")));
        assert!(screen.iter().any(|row| row.contains("Ana: bom dia")));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ana", 10), "Ana");
        assert_eq!(truncate("Ana Beatriz", 5), "Ana ~");
        assert_eq!(truncate("Ana", 0), "");
    }
}
