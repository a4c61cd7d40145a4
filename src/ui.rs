use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::session::{Phase, Snapshot};
use crate::slot::{Occupant, Slot};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;
const HORIZONTAL_MARGIN: u16 = 2;

const TITLE: &str = "🎄 Christmas Whack-a-Mole 🎄";

fn chunks(area: Rect) -> (Rect, Rect, Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);
    (parts[0], parts[1], parts[2])
}

/// Rectangles of the slot row, one per slot, left to right
pub fn slot_areas(area: Rect, slot_count: usize) -> Vec<Rect> {
    if slot_count == 0 {
        return Vec::new();
    }
    let (_, board, _) = chunks(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..slot_count).map(|_| Constraint::Ratio(1, slot_count as u32)))
        .split(board)
        .to_vec()
}

/// Slot under a mouse click, if any
pub fn slot_at(area: Rect, slot_count: usize, column: u16, row: u16) -> Option<usize> {
    slot_areas(area, slot_count).iter().position(|r| {
        column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
    })
}

fn header(snapshot: &Snapshot) -> Paragraph<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let timer_style = if snapshot.remaining_secs <= 10 && snapshot.phase == Phase::Active {
        bold.fg(Color::Red)
    } else {
        bold.fg(Color::Yellow)
    };

    let status = Line::from(vec![
        Span::styled("Score: ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(snapshot.score.to_string(), bold.fg(Color::Green)),
        Span::raw("   "),
        Span::styled("Best: ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(snapshot.best_score.to_string(), bold.fg(Color::Cyan)),
        Span::raw("   "),
        Span::styled(format!("{}s", snapshot.remaining_secs), timer_style),
        Span::raw("   "),
        Span::styled(
            format!("tempo {}", snapshot.tempo),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("   "),
        Span::raw(if snapshot.muted { "🔇" } else { "🔊" }),
    ]);

    Paragraph::new(vec![Line::from(Span::styled(TITLE, bold)), status])
        .alignment(Alignment::Center)
}

fn slot_body(slot: &Slot) -> (&'static str, Style) {
    if slot.feedback_active {
        return (
            "OUCH!",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    }
    match (slot.visible, slot.occupant) {
        (true, Some(Occupant::Favorable)) => (
            "GRINCH",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        (true, Some(Occupant::Unfavorable)) => (
            "SANTA",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        _ => ("", Style::default()),
    }
}

fn render_slot(slot: &Slot, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", slot.id + 1))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    block.render(area, buf);

    let (text, style) = slot_body(slot);
    let pad = inner.height.saturating_sub(1) / 2;
    let mut lines = vec![Line::default(); pad as usize];
    lines.push(Line::from(Span::styled(text, style)));
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(inner, buf);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_overlay(title: &str, lines: Vec<String>, area: Rect, buf: &mut Buffer) {
    let width = lines
        .iter()
        .map(|l| l.width())
        .chain(std::iter::once(title.width()))
        .max()
        .unwrap_or(0) as u16
        + 6;
    let height = lines.len() as u16 + 2;
    let rect = centered(area, width, height);

    Clear.render(rect, buf);
    Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    title.to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .title_alignment(Alignment::Center),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(rect, buf);
}

fn footer_hints(phase: Phase) -> String {
    let hints: &[&str] = match phase {
        Phase::Idle => &["enter start", "m mute", "esc quit"],
        Phase::Active => &["1-9 / click tap", "r restart", "m mute", "esc quit"],
        Phase::Finished => &["enter try again", "w share", "m mute", "esc quit"],
    };
    hints.iter().join("  ·  ")
}

impl Widget for &Snapshot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (header_area, _, footer_area) = chunks(area);
        header(self).render(header_area, buf);

        for (slot, slot_area) in self.slots.iter().zip(slot_areas(area, self.slots.len())) {
            render_slot(slot, slot_area, buf);
        }

        Paragraph::new(Span::styled(
            footer_hints(self.phase),
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(footer_area, buf);

        match self.phase {
            Phase::Idle => render_overlay(
                "Ready to Play?",
                vec![
                    "Hit the Grinch to earn points!".to_string(),
                    "Careful not to hit Santa, he costs a point!".to_string(),
                    "You have 60 seconds.".to_string(),
                    String::new(),
                    "Press enter to start".to_string(),
                ],
                area,
                buf,
            ),
            Phase::Finished => {
                let mut lines = vec![
                    format!("Final Score: {}", self.score),
                    format!("Highest Score: {}", self.best_score),
                ];
                if self.new_best {
                    lines.push("New best!".to_string());
                }
                lines.push(String::new());
                lines.push("enter: try again   w: share".to_string());
                render_overlay("Game Over!", lines, area, buf);
            }
            Phase::Active => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::TempoTier;

    fn snapshot(phase: Phase) -> Snapshot {
        Snapshot {
            score: 7,
            best_score: 10,
            remaining_secs: 42,
            phase,
            tempo: TempoTier::Base,
            muted: false,
            slots: (0..5)
                .map(|id| Slot {
                    id,
                    occupant: None,
                    visible: false,
                    feedback_active: false,
                    generation: 0,
                })
                .collect(),
            new_best: false,
        }
    }

    fn rendered(snapshot: &Snapshot, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        snapshot.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn active_board_shows_score_and_occupants() {
        let mut snap = snapshot(Phase::Active);
        snap.slots[1].occupant = Some(Occupant::Favorable);
        snap.slots[1].visible = true;
        snap.slots[3].feedback_active = true;

        let text = rendered(&snap, Rect::new(0, 0, 100, 20));
        assert!(text.contains("Score: 7"));
        assert!(text.contains("Best: 10"));
        assert!(text.contains("42s"));
        assert!(text.contains("GRINCH"));
        assert!(text.contains("OUCH!"));
        assert!(!text.contains("SANTA"));
    }

    #[test]
    fn hidden_occupant_not_drawn() {
        let mut snap = snapshot(Phase::Active);
        snap.slots[0].occupant = Some(Occupant::Unfavorable);
        let text = rendered(&snap, Rect::new(0, 0, 100, 20));
        assert!(!text.contains("SANTA"));
    }

    #[test]
    fn idle_shows_instructions() {
        let text = rendered(&snapshot(Phase::Idle), Rect::new(0, 0, 100, 20));
        assert!(text.contains("Ready to Play?"));
        assert!(text.contains("60 seconds"));
    }

    #[test]
    fn finished_shows_final_score() {
        let mut snap = snapshot(Phase::Finished);
        snap.new_best = true;
        let text = rendered(&snap, Rect::new(0, 0, 100, 20));
        assert!(text.contains("Game Over!"));
        assert!(text.contains("Final Score: 7"));
        assert!(text.contains("New best!"));
    }

    #[test]
    fn small_area_does_not_panic() {
        let area = Rect::new(0, 0, 12, 4);
        let mut buffer = Buffer::empty(area);
        (&snapshot(Phase::Finished)).render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn clicks_map_to_slots() {
        let area = Rect::new(0, 0, 104, 20);
        let areas = slot_areas(area, 5);
        assert_eq!(areas.len(), 5);
        let third = areas[2];
        assert_eq!(
            slot_at(area, 5, third.x + 1, third.y + 1),
            Some(2)
        );
        assert_eq!(slot_at(area, 5, 0, 0), None);
    }
}
