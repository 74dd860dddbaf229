//! Interactive operator console
//!
//! Reads one command per line from stdin and drives a single [`Feed`] plus the
//! [`PostSession`] of the open post. Generation failures are reported and the
//! console keeps running; only I/O failures end it.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::common::build_generator;
use super::render;
use crate::{
    ArticleCategory, BambooError, CommentId, Config, ConfigError, ContentGenerator, DmIntercept,
    EmergencyMode, Feed, GenerationError, PostDraft, PostSession, ReactionOutcome,
};

const HELP: &str = "\
명령어:
  list                  피드 목록
  more                  게시글 더 불러오기
  open <번호>           게시글 열기 (댓글 시뮬레이션)
  show                  열린 게시글 다시 보기
  ban                   쉐도우 밴 토글 (재분석)
  comment <내용>        운영자 댓글 달기
  reply <댓글번호> <내용> 댓글에 답글 달기
  persona on|off        👑운영자로 신원 공개
  reveal                작성자 실체 확인
  dm                    작성자 DM 해킹
  post <제목> | <내용>  운영자 글쓰기
  followup <내용>       열린 글에 대한 후속 글쓰기
  spicy on|off          매운맛 모드
  emergency <모드>      none | teacher-raid | police-alert
  help                  도움말
  quit                  종료";

/// Whether the console keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console {
    generator: ContentGenerator,
    feed: Feed,
    session: Option<PostSession>,
}

fn usage(reason: impl Into<String>) -> BambooError {
    BambooError::Generation(GenerationError::InvalidRequest {
        reason: reason.into(),
    })
}

fn no_open_post() -> BambooError {
    usage("no post is open (use: open <번호>)")
}

fn parse_switch(arg: &str) -> Result<bool, BambooError> {
    match arg {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(usage(format!("expected on or off, got '{other}'"))),
    }
}

fn parse_index(arg: &str, len: usize) -> Result<usize, BambooError> {
    arg.parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| usage(format!("no item number '{arg}' (1-{len})")))
}

impl Console {
    #[must_use]
    pub fn new(generator: ContentGenerator, feed: Feed) -> Self {
        Self {
            generator,
            feed,
            session: None,
        }
    }

    #[must_use]
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    #[must_use]
    pub fn session(&self) -> Option<&PostSession> {
        self.session.as_ref()
    }

    fn open_session(&mut self) -> Result<&mut PostSession, BambooError> {
        self.session.as_mut().ok_or_else(no_open_post)
    }

    /// Copy the open article back into the feed after its flag changed.
    fn sync_feed(&mut self) {
        if let Some(session) = &self.session {
            self.feed.update(session.article());
        }
    }

    fn list(&self) -> String {
        if self.feed.is_empty() {
            return "(피드가 비어 있음, more 로 불러오기)".to_string();
        }
        self.feed
            .articles()
            .iter()
            .enumerate()
            .map(|(i, a)| render::article_line(i, a))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn show(&self) -> Result<String, BambooError> {
        let session = self.session.as_ref().ok_or_else(no_open_post)?;
        let mut out = render::article_detail(session.article(), session.author_revealed());
        if let Some(result) = session.result() {
            out.push_str("\n\n");
            out.push_str(&render::indices(result));
        }
        out.push_str("\n\n");
        out.push_str(&render::thread(session.comments()));
        Ok(out)
    }

    fn reaction_note(outcome: ReactionOutcome) -> &'static str {
        match outcome {
            ReactionOutcome::Applied(0) => "(반응 없음)",
            ReactionOutcome::Applied(_) => "",
            ReactionOutcome::StaleEpoch | ReactionOutcome::UnknownComment => {
                "(게시글이 다시 분석되어 반응이 버려짐)"
            }
        }
    }

    /// Execute one console line and return what to print.
    ///
    /// # Errors
    ///
    /// Usage mistakes surface as `InvalidRequest`; generation failures as-is.
    pub async fn execute(&mut self, line: &str) -> Result<(Flow, String), BambooError> {
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        debug!(command = %command, "Console command");

        let output = match command {
            "" => String::new(),
            "help" => HELP.to_string(),
            "quit" | "exit" => return Ok((Flow::Quit, String::new())),
            "list" => self.list(),
            "more" => {
                let added = self.feed.load_more(&self.generator).await?;
                format!("{added}개 불러옴\n{}", self.list())
            }
            "open" => {
                let index = parse_index(rest, self.feed.len())?;
                let article = self.feed.articles()[index].clone();
                let mut session = PostSession::new(article, self.feed.settings());
                let outcome = session.analyze(&self.generator).await;
                self.session = Some(session);
                outcome?;
                self.show()?
            }
            "show" => self.show()?,
            "ban" => {
                let generator = &self.generator;
                let session = self.session.as_mut().ok_or_else(no_open_post)?;
                let outcome = session.toggle_and_reanalyze(generator).await;
                self.sync_feed();
                outcome?;
                self.show()?
            }
            "comment" => {
                if rest.is_empty() {
                    return Err(usage("usage: comment <내용>"));
                }
                let generator = &self.generator;
                let session = self.session.as_mut().ok_or_else(no_open_post)?;
                let outcome = session.comment(generator, rest).await?;
                format!("{}\n{}", self.show()?, Self::reaction_note(outcome))
                    .trim_end()
                    .to_string()
            }
            "reply" => {
                let (number, text) = rest
                    .split_once(' ')
                    .ok_or_else(|| usage("usage: reply <댓글번호> <내용>"))?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(usage("usage: reply <댓글번호> <내용>"));
                }
                let generator = &self.generator;
                let session = self.session.as_mut().ok_or_else(no_open_post)?;
                let index = parse_index(number, session.comments().len())?;
                let id: CommentId = session.comments()[index].id.clone();
                let outcome = session.reply(generator, &id, text).await?;
                format!("{}\n{}", self.show()?, Self::reaction_note(outcome))
                    .trim_end()
                    .to_string()
            }
            "persona" => {
                let revealed = parse_switch(rest)?;
                self.open_session()?.set_identity_revealed(revealed);
                if revealed {
                    "이제 👑운영자로 활동합니다".to_string()
                } else {
                    "이제 익명(나)으로 활동합니다".to_string()
                }
            }
            "reveal" => {
                let identity = self.open_session()?.reveal_author().clone();
                format!("🔓 작성자 실체: {identity}")
            }
            "dm" => {
                let article = self.open_session()?.article().clone();
                let mut intercept = DmIntercept::new(article);
                let transcript = intercept.run(&self.generator).await?;
                render::transcript(transcript)
            }
            "post" => {
                let (title, content) = rest
                    .split_once('|')
                    .ok_or_else(|| usage("usage: post <제목> | <내용>"))?;
                let article = self.feed.compose_admin_post(PostDraft {
                    title: title.trim().to_string(),
                    content: content.trim().to_string(),
                    category: ArticleCategory::Secret,
                });
                render::article_line(0, article)
            }
            "followup" => {
                let mut draft = Feed::follow_up_draft(self.open_session()?.article());
                draft.content = rest.to_string();
                let article = self.feed.compose_admin_post(draft);
                render::article_line(0, article)
            }
            "spicy" => {
                let spicy = parse_switch(rest)?;
                self.feed.set_spicy(spicy);
                if let Some(session) = &mut self.session {
                    session.set_spicy(spicy);
                }
                format!("매운맛 모드: {}", if spicy { "on" } else { "off" })
            }
            "emergency" => {
                let mode: EmergencyMode = rest.parse().map_err(|reason: String| {
                    BambooError::Config(ConfigError::InvalidValue {
                        key: "emergency".to_string(),
                        value: reason,
                    })
                })?;
                self.feed.set_emergency(mode);
                format!("긴급 모드: {mode}")
            }
            other => return Err(usage(format!("unknown command '{other}' (try: help)"))),
        };
        Ok((Flow::Continue, output))
    }
}

/// Run the console on stdin until `quit` or end of input.
pub async fn execute_console_command(config: &Config) -> Result<(), BambooError> {
    let generator = build_generator(config)?;
    let mut console = Console::new(generator, Feed::from_config(config));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("bamboo 운영자 콘솔 (help: 도움말)");
    loop {
        {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "bamboo> ")?;
            stdout.flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match console.execute(&line).await {
            Ok((Flow::Quit, _)) => break,
            Ok((Flow::Continue, output)) => {
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            Err(BambooError::Io(e)) => return Err(BambooError::Io(e)),
            Err(e) => eprintln!("{}", e.display_for_user()),
        }
    }
    Ok(())
}
