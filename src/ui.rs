use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use employee_dashboard::{Dashboard, DashboardPass, Gender, InputEvent, Tables};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Map, MapResolution},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph,
    },
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;

/// Which input the arrow keys currently adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Department,
    AgeLow,
    AgeHigh,
}

impl Control {
    pub fn next(&self) -> Self {
        match self {
            Control::Department => Control::AgeLow,
            Control::AgeLow => Control::AgeHigh,
            Control::AgeHigh => Control::Department,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Control::Department => Control::AgeHigh,
            Control::AgeLow => Control::Department,
            Control::AgeHigh => Control::AgeLow,
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub focus: Control,
    pub last_error: Option<String>,
}

impl App {
    pub fn new(tables: Arc<Tables>) -> Result<Self> {
        Ok(Self {
            dashboard: Dashboard::new(tables)?,
            focus: Control::Department,
            last_error: None,
        })
    }

    pub fn pass(&self) -> &DashboardPass {
        self.dashboard.pass()
    }

    pub fn next_control(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_control(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Move the focused control by `step` and run a pass.
    pub fn adjust(&mut self, step: i64) {
        let selection = self.dashboard.selection();
        let range = selection.age_range();
        let domain = self.dashboard.tables().age_domain();

        let event = match self.focus {
            Control::Department => {
                let departments = self.dashboard.tables().departments();
                let current = departments
                    .iter()
                    .position(|d| d == selection.department())
                    .unwrap_or(0) as i64;
                let len = departments.len() as i64;
                let next = (current + step).rem_euclid(len) as usize;
                InputEvent::SelectDepartment(departments[next].clone())
            }
            Control::AgeLow => {
                let low = (range.low() as i64 + step).clamp(domain.min as i64, range.high() as i64);
                InputEvent::SetAgeRange {
                    low: low as u32,
                    high: range.high(),
                }
            }
            Control::AgeHigh => {
                let high = (range.high() as i64 + step).clamp(range.low() as i64, domain.max as i64);
                InputEvent::SetAgeRange {
                    low: range.low(),
                    high: high as u32,
                }
            }
        };

        self.dispatch(&[event]);
    }

    pub fn reset(&mut self) {
        self.dispatch(&[InputEvent::Reset]);
    }

    fn dispatch(&mut self, events: &[InputEvent]) {
        match self.dashboard.handle(events) {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, event::read);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B, F>(terminal: &mut Terminal<B>, app: &mut App, mut next_event: F) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    F: FnMut() -> io::Result<Event>,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = next_event()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_control(),
                KeyCode::BackTab => app.previous_control(),
                KeyCode::Right | KeyCode::Char('l') => app.adjust(1),
                KeyCode::Left | KeyCode::Char('h') => app.adjust(-1),
                KeyCode::PageUp => app.adjust(5),
                KeyCode::PageDown => app.adjust(-5),
                KeyCode::Char('r') => app.reset(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Header
            Constraint::Percentage(45), // Joining + map
            Constraint::Length(3),      // Controls
            Constraint::Min(0),         // Generation + department/gender
            Constraint::Length(3),      // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_joining(f, top[0], app.pass());
    render_map(f, top[1], app.pass());

    render_controls(f, chunks[2], app);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    render_generations(f, bottom[0], app.pass());
    render_gender_by_department(f, bottom[1], app.pass());

    render_status_bar(f, chunks[4], app);
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let tables = app.dashboard.tables();
    let domain = tables.age_domain();

    let header_text = vec![Line::from(vec![
        Span::styled(
            "Employee Demography Dashboard",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Employees: {}", tables.employees().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Departments: {}", tables.departments().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Ages {}-{}", domain.min, domain.max),
            Style::default().fg(Color::White),
        ),
    ])];

    let header = Paragraph::new(header_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_joining(f: &mut Frame, area: Rect, pass: &DashboardPass) {
    let spec = &pass.charts.joining;
    let points: Vec<(f64, f64)> = pass
        .joining
        .iter()
        .map(|j| (j.join_year as f64, j.join_count as f64))
        .collect();

    let (x_min, x_max) = match (pass.joining.first(), pass.joining.last()) {
        (Some(first), Some(last)) if first.join_year < last.join_year => {
            (first.join_year as f64, last.join_year as f64)
        }
        (Some(only), _) => (only.join_year as f64 - 1.0, only.join_year as f64 + 1.0),
        _ => (0.0, 1.0),
    };
    let y_max = pass
        .joining
        .iter()
        .map(|j| j.join_count)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let datasets = vec![
        Dataset::default()
            .name(spec.label_for(&spec.y).to_string())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
        // Markers on top of the line
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&points),
    ];

    let chart = Chart::new(datasets)
        .block(titled_block(&spec.title))
        .x_axis(
            Axis::default()
                .title(spec.label_for(&spec.x).to_string())
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{}", x_min)),
                    Span::raw(format!("{}", ((x_min + x_max) / 2.0).round())),
                    Span::raw(format!("{}", x_max)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(spec.label_for(&spec.y).to_string())
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_max * 1.1])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format!("{}", y_max)),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_map(f: &mut Frame, area: Rect, pass: &DashboardPass) {
    let provinces = &pass.provinces;

    // Indonesia when there is nothing to frame
    let (mut x_bounds, mut y_bounds) = ([94.0, 142.0], [-12.0, 7.0]);
    if !provinces.is_empty() {
        let lon = provinces.iter().map(|p| p.longitude);
        let lat = provinces.iter().map(|p| p.latitude);
        x_bounds = [
            lon.clone().fold(f64::INFINITY, f64::min) - 3.0,
            lon.fold(f64::NEG_INFINITY, f64::max) + 3.0,
        ];
        y_bounds = [
            lat.clone().fold(f64::INFINITY, f64::min) - 3.0,
            lat.fold(f64::NEG_INFINITY, f64::max) + 3.0,
        ];
    }
    let max_total = provinces.iter().map(|p| p.total).max().unwrap_or(1).max(1) as f64;

    let canvas = Canvas::default()
        .block(titled_block(&pass.charts.provinces.title))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for province in provinces {
                ctx.draw(&Circle {
                    x: province.longitude,
                    y: province.latitude,
                    radius: 0.3 + 1.7 * province.total as f64 / max_total,
                    color: Color::LightRed,
                });
            }
            for province in provinces {
                ctx.print(
                    province.longitude,
                    province.latitude,
                    Span::styled(
                        format!("{} ({}M/{}F)", province.province, province.male, province.female),
                        Style::default().fg(Color::White),
                    ),
                );
            }
        });

    f.render_widget(canvas, area);
}

fn render_controls(f: &mut Frame, area: Rect, app: &App) {
    let selection = app.dashboard.selection();
    let range = selection.age_range();

    let style_for = |control: Control| {
        if app.focus == control {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let mut spans = vec![
        Span::raw(" Department: "),
        Span::styled(format!("◀ {} ▶", selection.department()), style_for(Control::Department)),
        Span::raw("   Age range: "),
        Span::styled(format!("{}", range.low()), style_for(Control::AgeLow)),
        Span::raw(" to "),
        Span::styled(format!("{}", range.high()), style_for(Control::AgeHigh)),
    ];

    if let Some(error) = &app.last_error {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
    }

    let controls = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Controls "),
    );

    f.render_widget(controls, area);
}

fn render_generations(f: &mut Frame, area: Rect, pass: &DashboardPass) {
    let bars: Vec<Bar> = pass
        .generations
        .iter()
        .map(|g| {
            Bar::default()
                .value(g.num_people as u64)
                .label(Line::from(g.generation.clone()))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block(&pass.charts.generations.title))
        .bar_width(9)
        .bar_gap(2)
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(BarGroup::default().bars(&bars));

    f.render_widget(chart, area);
}

fn gender_color(gender: Gender) -> Color {
    match gender {
        Gender::Female => Color::Magenta,
        Gender::Male => Color::Blue,
    }
}

fn render_gender_by_department(f: &mut Frame, area: Rect, pass: &DashboardPass) {
    // One group per department, in order of first appearance in the sorted rows
    let mut groups: Vec<(String, Vec<Bar>)> = Vec::new();
    for row in &pass.gender_by_department {
        let bar = Bar::default()
            .value(row.num_people as u64)
            .label(Line::from(row.gender.to_string()))
            .style(Style::default().fg(gender_color(row.gender)));
        match groups.iter_mut().find(|(dept, _)| *dept == row.department_name) {
            Some((_, bars)) => bars.push(bar),
            None => groups.push((row.department_name.clone(), vec![bar])),
        }
    }

    let mut chart = BarChart::default()
        .block(titled_block(&pass.charts.gender_by_department.title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);

    for (department, bars) in &groups {
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(department.clone()))
                .bars(bars),
        );
    }

    f.render_widget(chart, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let pass = app.pass();

    let status_spans = vec![
        Span::styled(
            format!(
                " {} years | {} provinces | {} generations ",
                pass.joining.len(),
                pass.provinces.len(),
                pass.generations.len()
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Control | "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" Adjust | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" ±5 | "),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Reset | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
