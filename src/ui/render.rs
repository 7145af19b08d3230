//! 界面渲染
//!
//! 按 UiState.view 分发到四个画面：Login（凭据表单）、Setup（服务选择 + 密钥输入）、
//! Chat（历史 + 输入框）、Crud（员工表格 + 表单）。标题栏统一显示状态行文字。

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::chat::Role;
use crate::core::{UiState, View};

/// Setup 视图的固定服务列表（与后端约定的大写标识符）
pub const SERVICES: &[&str] = &["GEMINI", "GROQ", "OPENROUTER"];

/// 当前键盘焦点落在哪个控件上
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Username,
    Password,
    ApiKey,
    Service,
    ChatInput,
    EmpName,
    EmpRole,
    EmpDepartment,
    EmpSalary,
    EmployeeList,
}

/// 全部输入缓冲；输入是显式状态，渲染与提交都从这里取值
#[derive(Debug, Default)]
pub struct InputState {
    pub focus: InputFocus,
    pub username: String,
    pub password: String,
    pub api_key: String,
    pub service_index: usize,
    pub chat_input: String,
    pub emp_name: String,
    pub emp_role: String,
    pub emp_department: String,
    pub emp_salary: String,
    pub selected_employee: usize,
}

impl InputState {
    /// 视图切换时的默认焦点
    pub fn default_focus(view: View) -> InputFocus {
        match view {
            View::Login => InputFocus::Username,
            View::Setup => InputFocus::ApiKey,
            View::Chat => InputFocus::ChatInput,
            View::Crud => InputFocus::EmpName,
        }
    }
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn title_bar(state: &UiState, screen: &str) -> Paragraph<'static> {
    let user = state
        .username
        .as_deref()
        .map(|u| format!(" │ {}", u))
        .unwrap_or_default();
    let text = format!(" Agentic Vault │ {}{} │ {} ", screen, user, state.status);
    Paragraph::new(text).style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn hint_bar(hint: &str) -> Paragraph<'_> {
    Paragraph::new(hint).style(Style::default().fg(Color::DarkGray))
}

/// 将内容按宽度换行，按字符数处理避免在 UTF-8 中间截断
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        for ch in para.chars() {
            if line.chars().count() >= width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// 绘制一帧；Chat 视图将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(
    f: &mut Frame,
    state: &UiState,
    input: &InputState,
    conversation_scroll: usize,
    out: &mut (usize, usize),
) {
    match state.view {
        View::Login => draw_login(f, state, input),
        View::Setup => draw_setup(f, state, input),
        View::Chat => draw_chat(f, state, input, conversation_scroll, out),
        View::Crud => draw_crud(f, state, input),
    }
}

fn draw_login(f: &mut Frame, state: &UiState, input: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(title_bar(state, "Login"), chunks[0]);

    let username = Paragraph::new(input.username.as_str())
        .block(field_block("Username", input.focus == InputFocus::Username));
    f.render_widget(username, chunks[1]);

    let masked = "*".repeat(input.password.chars().count());
    let password = Paragraph::new(masked)
        .block(field_block("Password", input.focus == InputFocus::Password));
    f.render_widget(password, chunks[2]);

    f.render_widget(
        hint_bar(" Tab 切换字段 │ Enter 登录 │ Ctrl+Q 退出 "),
        chunks[4],
    );
}

fn draw_setup(f: &mut Frame, state: &UiState, input: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(SERVICES.len() as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(title_bar(state, "Vault Setup"), chunks[0]);

    let items: Vec<ListItem> = SERVICES
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let style = if i == input.service_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(format!("  {}", s), style)))
        })
        .collect();
    let services =
        List::new(items).block(field_block("Service", input.focus == InputFocus::Service));
    f.render_widget(services, chunks[1]);

    // API key 只写：输入框里也只显示掩码
    let masked = "*".repeat(input.api_key.chars().count());
    let key = Paragraph::new(masked)
        .block(field_block("API Key", input.focus == InputFocus::ApiKey));
    f.render_widget(key, chunks[2]);

    f.render_widget(
        hint_bar(" Tab 切换 │ ↑↓ 选服务 │ Enter 保存 │ F2 跳过进入对话 │ Ctrl+Q 退出 "),
        chunks[4],
    );
}

fn draw_chat(
    f: &mut Frame,
    state: &UiState,
    input: &InputState,
    conversation_scroll: usize,
    out: &mut (usize, usize),
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(title_bar(state, "Chat"), chunks[0]);

    let conv_area = chunks[1];
    let content_width = conv_area.width.saturating_sub(2) as usize;

    // 每条消息按宽度换行，消息之间加空行分隔
    let mut text_lines: Vec<Line> = Vec::new();
    for (idx, m) in state.conversation.iter().enumerate() {
        if idx > 0 {
            text_lines.push(Line::from(Span::raw("")));
        }
        let (prefix, color) = match m.role {
            Role::User => ("You   ", Color::Cyan),
            Role::Agent => ("Agent ", Color::Green),
        };
        let wrapped = wrap_text(&m.text, content_width.max(40));
        for (i, line) in wrapped.into_iter().enumerate() {
            let pref = if i == 0 { prefix } else { "      " };
            text_lines.push(Line::from(vec![
                Span::styled(pref, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(line),
            ]));
        }
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let max_scroll = total_lines.saturating_sub(content_height);
    let scroll_offset = conversation_scroll.min(max_scroll);

    let conversation = Paragraph::new(Text::from(text_lines))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset as u16, 0));
    f.render_widget(conversation, conv_area);

    let input_box = Paragraph::new(input.chat_input.as_str())
        .block(field_block("Message", input.focus == InputFocus::ChatInput))
        .style(if state.input_locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        });
    f.render_widget(input_box, chunks[2]);

    f.render_widget(
        hint_bar(" Enter 发送 │ ↑↓ 滚动 │ F2 密钥配置 │ F3 员工目录 │ Ctrl+Q 退出 "),
        chunks[3],
    );

    out.0 = total_lines;
    out.1 = content_height;
}

fn draw_crud(f: &mut Frame, state: &UiState, input: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(title_bar(state, "Employees"), chunks[0]);

    let rows: Vec<Row> = state
        .employees
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let style = if i == input.selected_employee
                && input.focus == InputFocus::EmployeeList
            {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                e.id.to_string(),
                e.name.clone(),
                e.role.clone(),
                e.department.clone(),
                format!("{:.0}", e.salary),
            ])
            .style(style)
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["ID", "Name", "Role", "Department", "Salary"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(field_block("Directory", input.focus == InputFocus::EmployeeList));
    f.render_widget(table, chunks[1]);

    let form = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(20),
        ])
        .split(chunks[2]);
    draw_form_field(f, form[0], "Name", &input.emp_name, input.focus == InputFocus::EmpName);
    draw_form_field(f, form[1], "Role", &input.emp_role, input.focus == InputFocus::EmpRole);
    draw_form_field(
        f,
        form[2],
        "Department",
        &input.emp_department,
        input.focus == InputFocus::EmpDepartment,
    );
    draw_form_field(
        f,
        form[3],
        "Salary",
        &input.emp_salary,
        input.focus == InputFocus::EmpSalary,
    );

    f.render_widget(
        hint_bar(" Tab 切换 │ Enter 创建 │ ↑↓ 选行 │ Del 删除选中 │ F3 返回对话 │ Ctrl+Q 退出 "),
        chunks[3],
    );
}

fn draw_form_field(f: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let field = Paragraph::new(value)
        .alignment(Alignment::Left)
        .block(field_block(title, focused));
    f.render_widget(field, area);
}
