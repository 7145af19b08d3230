//! TUI 应用主循环
//!
//! 进入全屏/原始模式，轮询 state_rx 与键盘事件，按当前视图把按键转为输入编辑或
//! Command 发送给运行时，每帧用 draw 渲染 UiState 快照与输入缓冲。
//! 输入缓冲是 UI 的本地状态；密钥与员工表单只在对应操作成功后清空
//! （通过快照里的单调计数观察成功）。

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::watch;

use crate::core::{Command, UiState, View};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::{draw, InputFocus, InputState, SERVICES};

/// 运行 TUI：启用原始模式与全屏，循环 poll 事件 + 渲染，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<UiState>,
    cmd_tx: tokio::sync::mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(cmd_tx);
    let mut input = InputState::default();
    let mut conversation_scroll = 0usize;
    let mut last_view = View::Login;
    let mut last_history_len = 0usize;
    let mut last_vault_seq = 0u64;
    let mut last_create_seq = 0u64;

    loop {
        let state = state_rx.borrow().clone();

        // 视图切换时重置焦点
        if state.view != last_view {
            last_view = state.view;
            input.focus = InputState::default_focus(state.view);
        }

        // 新消息到达时滚到底部
        if state.conversation.len() != last_history_len {
            last_history_len = state.conversation.len();
            conversation_scroll = usize::MAX;
        }

        // 保存成功 → 清空密钥输入；创建成功 → 清空员工表单
        if state.vault_save_seq != last_vault_seq {
            last_vault_seq = state.vault_save_seq;
            input.api_key.clear();
        }
        if state.employee_create_seq != last_create_seq {
            last_create_seq = state.employee_create_seq;
            input.emp_name.clear();
            input.emp_role.clear();
            input.emp_department.clear();
            input.emp_salary.clear();
        }

        // 目录缩短时把选中行拉回范围内
        if input.selected_employee >= state.employees.len() {
            input.selected_employee = state.employees.len().saturating_sub(1);
        }

        if let Ok(Some(ev)) = event_handler.poll() {
            match ev {
                AppEvent::Command(cmd) => {
                    if matches!(cmd, Command::Quit) {
                        event_handler.send(Command::Quit);
                        break;
                    }
                }
                AppEvent::Key(key) if !state.input_locked => match state.view {
                    View::Login => handle_login_key(key, &mut input, &event_handler),
                    View::Setup => handle_setup_key(key, &mut input, &event_handler),
                    View::Chat => handle_chat_key(
                        key,
                        &mut input,
                        &mut conversation_scroll,
                        &event_handler,
                    ),
                    View::Crud => handle_crud_key(key, &mut input, &state, &event_handler),
                },
                _ => {}
            }
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| {
            draw(f, &state, &input, conversation_scroll, &mut scroll_info);
        })?;
        let (total_lines, viewport_height) = scroll_info;
        let max_scroll = total_lines.saturating_sub(viewport_height);
        conversation_scroll = conversation_scroll.min(max_scroll);

        tokio::task::yield_now().await;
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

fn handle_login_key(key: KeyEvent, input: &mut InputState, events: &EventHandler) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            input.focus = match input.focus {
                InputFocus::Username => InputFocus::Password,
                _ => InputFocus::Username,
            };
        }
        KeyCode::Enter => {
            // 有意不拦截空字段：空提交由服务端报错（与观察到的行为一致）
            events.send(Command::Login {
                username: input.username.clone(),
                password: input.password.clone(),
            });
        }
        KeyCode::Backspace => {
            match input.focus {
                InputFocus::Password => input.password.pop(),
                _ => input.username.pop(),
            };
        }
        KeyCode::Char(c) => match input.focus {
            InputFocus::Password => input.password.push(c),
            _ => input.username.push(c),
        },
        _ => {}
    }
}

fn handle_setup_key(key: KeyEvent, input: &mut InputState, events: &EventHandler) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            input.focus = match input.focus {
                InputFocus::ApiKey => InputFocus::Service,
                _ => InputFocus::ApiKey,
            };
        }
        KeyCode::Up if input.focus == InputFocus::Service => {
            input.service_index = input.service_index.saturating_sub(1);
        }
        KeyCode::Down if input.focus == InputFocus::Service => {
            input.service_index = (input.service_index + 1).min(SERVICES.len() - 1);
        }
        KeyCode::Enter => {
            // 空 key 由组件静默拦截；成功后通过 vault_save_seq 清空输入
            events.send(Command::SaveKey {
                service: SERVICES[input.service_index].to_string(),
                api_key: input.api_key.clone(),
            });
        }
        KeyCode::F(2) => events.send(Command::Navigate(View::Chat)),
        KeyCode::Backspace if input.focus == InputFocus::ApiKey => {
            input.api_key.pop();
        }
        KeyCode::Char(c) if input.focus == InputFocus::ApiKey => {
            input.api_key.push(c);
        }
        _ => {}
    }
}

fn handle_chat_key(
    key: KeyEvent,
    input: &mut InputState,
    conversation_scroll: &mut usize,
    events: &EventHandler,
) {
    match key.code {
        KeyCode::Enter => {
            let text = input.chat_input.trim().to_string();
            input.chat_input.clear();
            if !text.is_empty() {
                events.send(Command::SendMessage(text));
            }
        }
        KeyCode::Up => *conversation_scroll = conversation_scroll.saturating_sub(1),
        KeyCode::Down => *conversation_scroll = conversation_scroll.saturating_add(1),
        KeyCode::PageUp => *conversation_scroll = conversation_scroll.saturating_sub(10),
        KeyCode::PageDown => *conversation_scroll = conversation_scroll.saturating_add(10),
        KeyCode::F(2) => events.send(Command::Navigate(View::Setup)),
        KeyCode::F(3) => events.send(Command::Navigate(View::Crud)),
        KeyCode::Backspace => {
            input.chat_input.pop();
        }
        KeyCode::Char(c) => input.chat_input.push(c),
        _ => {}
    }
}

fn handle_crud_key(
    key: KeyEvent,
    input: &mut InputState,
    state: &UiState,
    events: &EventHandler,
) {
    match key.code {
        KeyCode::Tab => {
            input.focus = match input.focus {
                InputFocus::EmpName => InputFocus::EmpRole,
                InputFocus::EmpRole => InputFocus::EmpDepartment,
                InputFocus::EmpDepartment => InputFocus::EmpSalary,
                InputFocus::EmpSalary => InputFocus::EmployeeList,
                _ => InputFocus::EmpName,
            };
        }
        KeyCode::BackTab => {
            input.focus = match input.focus {
                InputFocus::EmpRole => InputFocus::EmpName,
                InputFocus::EmpDepartment => InputFocus::EmpRole,
                InputFocus::EmpSalary => InputFocus::EmpDepartment,
                InputFocus::EmployeeList => InputFocus::EmpSalary,
                _ => InputFocus::EmployeeList,
            };
        }
        KeyCode::Up if input.focus == InputFocus::EmployeeList => {
            input.selected_employee = input.selected_employee.saturating_sub(1);
        }
        KeyCode::Down if input.focus == InputFocus::EmployeeList => {
            input.selected_employee = (input.selected_employee + 1)
                .min(state.employees.len().saturating_sub(1));
        }
        KeyCode::Delete if input.focus == InputFocus::EmployeeList => {
            if let Some(e) = state.employees.get(input.selected_employee) {
                events.send(Command::DeleteEmployee(e.id));
            }
        }
        KeyCode::Enter if input.focus != InputFocus::EmployeeList => {
            // 校验（非空 name、salary 可解析）在组件层；成功后通过 employee_create_seq 清表单
            events.send(Command::CreateEmployee {
                name: input.emp_name.clone(),
                role: input.emp_role.clone(),
                department: input.emp_department.clone(),
                salary: input.emp_salary.clone(),
            });
        }
        KeyCode::F(3) => events.send(Command::Navigate(View::Chat)),
        KeyCode::Backspace => {
            match input.focus {
                InputFocus::EmpName => input.emp_name.pop(),
                InputFocus::EmpRole => input.emp_role.pop(),
                InputFocus::EmpDepartment => input.emp_department.pop(),
                InputFocus::EmpSalary => input.emp_salary.pop(),
                _ => None,
            };
        }
        KeyCode::Char(c) => match input.focus {
            InputFocus::EmpName => input.emp_name.push(c),
            InputFocus::EmpRole => input.emp_role.push(c),
            InputFocus::EmpDepartment => input.emp_department.push(c),
            InputFocus::EmpSalary => input.emp_salary.push(c),
            _ => {}
        },
        _ => {}
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
