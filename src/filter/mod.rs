//! # Filter module
//!
//! Module dedicated to the bulk filter: the runner that iterates
//! matching messages of the selected folders in fixed-size chunks and
//! applies the requested actions to each chunk.
//!
//! The main entities are the [`FilterConfig`] (built once from CLI
//! input, read-only during execution) and the [`BulkFilter`] runner.

use std::{io::Write, result};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    backend::{self, MailSession, Uid},
    flag::{Flag, FlagSpec},
    folder::{self, FolderSelection},
    label::{self, LabelSpec},
};

/// The default size of a message chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot use --fail-if-empty with more than one folder")]
    InvalidOptionsError,
    #[error("cannot filter messages: filter returned zero messages")]
    NoMatchingMessagesError,
    #[error(transparent)]
    ResolveFoldersError(#[from] folder::Error),
    #[error(transparent)]
    SessionError(#[from] backend::Error),
    #[error("cannot write show output")]
    WriteShowOutputError(#[source] std::io::Error),
}

/// The bulk filter configuration: which messages to select and which
/// actions to apply to them.
#[derive(Clone, Debug)]
pub struct FilterConfig {
    /// The provider search query. No query selects all messages of
    /// each folder.
    pub query: Option<String>,

    /// Abort the run when the search yields zero messages. Only
    /// permitted when exactly one folder is targeted.
    pub fail_if_empty: bool,

    /// The flags to add to or remove from matching messages.
    pub flags: Vec<FlagSpec>,

    /// The labels to add to or remove from matching messages.
    pub labels: Vec<LabelSpec>,

    pub delete: bool,
    pub trash: bool,
    pub show: bool,
    pub archive: bool,

    /// The folders to process.
    pub folders: FolderSelection,

    /// The maximum number of messages mutated per protocol call.
    pub chunk_size: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            query: None,
            fail_if_empty: false,
            flags: Vec::new(),
            labels: Vec::new(),
            delete: false,
            trash: false,
            show: false,
            archive: false,
            folders: FolderSelection::All,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FilterConfig {
    /// Checks option consistency that does not need a connection:
    /// `fail_if_empty` with several explicit folders is rejected
    /// here, before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.fail_if_empty {
            if let FolderSelection::Names(names) = &self.folders {
                if names.len() > 1 {
                    return Err(Error::InvalidOptionsError);
                }
            }
        }

        Ok(())
    }

    fn add_flags(&self) -> Vec<Flag> {
        self.flags
            .iter()
            .filter(|spec| spec.is_add())
            .map(|spec| spec.flag)
            .collect()
    }

    fn remove_flags(&self) -> Vec<Flag> {
        self.flags
            .iter()
            .filter(|spec| spec.is_remove())
            .map(|spec| spec.flag)
            .collect()
    }

    fn add_labels(&self) -> Vec<String> {
        self.labels
            .iter()
            .filter(|spec| spec.is_add())
            .map(|spec| spec.name.clone())
            .collect()
    }

    fn remove_labels(&self) -> Vec<String> {
        self.labels
            .iter()
            .filter(|spec| spec.is_remove())
            .map(|spec| spec.name.clone())
            .collect()
    }
}

/// The bulk filter runner.
///
/// Drives one mail session, fully sequentially: resolve folders, then
/// per folder search and chunk, then per chunk dispatch the requested
/// actions in a fixed order. Show output goes to the given writer so
/// logs on stderr do not interleave with it.
pub struct BulkFilter<'a> {
    config: &'a FilterConfig,
    session: &'a mut dyn MailSession,
    out: &'a mut dyn Write,
}

impl<'a> BulkFilter<'a> {
    pub fn new(
        config: &'a FilterConfig,
        session: &'a mut dyn MailSession,
        out: &'a mut dyn Write,
    ) -> Self {
        Self {
            config,
            session,
            out,
        }
    }

    /// Runs the whole filter: folder resolution then per-folder
    /// processing, in order.
    pub fn run(&mut self) -> Result<()> {
        self.config.validate()?;

        let known = self.session.list_folders()?;
        let folders = self.config.folders.resolve(&known)?;

        if self.config.fail_if_empty && folders.len() > 1 {
            return Err(Error::InvalidOptionsError);
        }

        for folder in &folders {
            self.process_folder(folder)?;
        }

        Ok(())
    }

    /// Processes one folder: select, search, then dispatch each
    /// chunk. A folder that cannot be selected is logged and skipped,
    /// it does not abort the run.
    fn process_folder(&mut self, folder: &str) -> Result<()> {
        info!("processing folder {folder}");

        if let Err(err) = self.session.select_folder(folder) {
            warn!("cannot select folder {folder}, skipping it: {err}");
            debug!("{err:?}");
            return Ok(());
        }

        let uids = match &self.config.query {
            None => {
                info!("selecting all messages in {folder}");
                self.session.search_all()?
            }
            Some(query) => {
                info!("selecting messages in {folder} matching: {query}");
                self.session.search_query(query)?
            }
        };

        info!("found {} messages", uids.len());

        if self.config.fail_if_empty && uids.is_empty() {
            return Err(Error::NoMatchingMessagesError);
        }

        for chunk in uids.chunks(self.config.chunk_size.max(1)) {
            self.process_chunk(folder, chunk)?;
        }

        Ok(())
    }

    /// Applies the requested actions to one chunk, in a fixed order:
    /// flags, labels, archive, show, trash, delete. Actions are
    /// independent; the add call is always followed by the remove
    /// call, even with an empty list (a valid protocol no-op).
    fn process_chunk(&mut self, folder: &str, uids: &[Uid]) -> Result<()> {
        let range = chunk_range(uids);

        if !self.config.flags.is_empty() {
            info!("applying flags to messages {range} from {folder}");
            self.session.add_flags(uids, &self.config.add_flags())?;
            self.session.remove_flags(uids, &self.config.remove_flags())?;
        }

        if !self.config.labels.is_empty() {
            info!("labelling messages {range} from {folder}");
            self.session.add_labels(uids, &self.config.add_labels())?;
            self.session
                .remove_labels(uids, &self.config.remove_labels())?;
        }

        if self.config.archive {
            info!("archiving messages {range} from {folder}");
            self.session
                .remove_labels(uids, &[label::INBOX.to_string()])?;
        }

        if self.config.show {
            info!("getting info for messages {range} from {folder}");
            let mut envelopes = self.session.fetch_envelopes(uids)?;
            envelopes.sort_by_uid();
            for envelope in envelopes.iter() {
                envelope
                    .write_to(&mut *self.out)
                    .map_err(Error::WriteShowOutputError)?;
            }
        }

        if self.config.trash {
            info!("trashing messages {range} from {folder}");
            self.session
                .add_labels(uids, &[label::TRASH.to_string()])?;
        }

        if self.config.delete {
            info!("deleting messages {range} from {folder}");
            self.session.delete_messages(uids)?;
            info!("expunging messages {range} from {folder}");
            self.session.expunge()?;
        }

        Ok(())
    }
}

fn chunk_range(uids: &[Uid]) -> String {
    match (uids.first(), uids.last()) {
        (Some(first), Some(last)) if first != last => format!("{first}..{last}"),
        (Some(first), _) => first.to_string(),
        _ => String::from("none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Envelope, Envelopes};
    use crate::label::Sign;

    #[derive(Debug, Eq, PartialEq)]
    enum Call {
        ListFolders,
        SelectFolder(String),
        SearchAll,
        SearchQuery(String),
        AddFlags(Vec<Uid>, Vec<Flag>),
        RemoveFlags(Vec<Uid>, Vec<Flag>),
        AddLabels(Vec<Uid>, Vec<String>),
        RemoveLabels(Vec<Uid>, Vec<String>),
        DeleteMessages(Vec<Uid>),
        Expunge,
        FetchEnvelopes(Vec<Uid>),
    }

    #[derive(Default)]
    struct MockSession {
        folders: Vec<String>,
        unselectable: Vec<String>,
        uids: Vec<Uid>,
        envelopes: Vec<Envelope>,
        calls: Vec<Call>,
    }

    impl MockSession {
        fn new(folders: &[&str], uids: &[Uid]) -> Self {
            Self {
                folders: folders.iter().map(ToString::to_string).collect(),
                uids: uids.to_vec(),
                ..Default::default()
            }
        }
    }

    impl MailSession for MockSession {
        fn list_folders(&mut self) -> backend::Result<Vec<String>> {
            self.calls.push(Call::ListFolders);
            Ok(self.folders.clone())
        }

        fn select_folder(&mut self, folder: &str) -> backend::Result<()> {
            self.calls.push(Call::SelectFolder(folder.to_string()));
            if self.unselectable.iter().any(|f| f == folder) {
                return Err(backend::Error::SelectFolderImapError(
                    imap::Error::ConnectionLost,
                    folder.to_string(),
                ));
            }
            Ok(())
        }

        fn search_all(&mut self) -> backend::Result<Vec<Uid>> {
            self.calls.push(Call::SearchAll);
            Ok(self.uids.clone())
        }

        fn search_query(&mut self, query: &str) -> backend::Result<Vec<Uid>> {
            self.calls.push(Call::SearchQuery(query.to_string()));
            Ok(self.uids.clone())
        }

        fn add_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> backend::Result<()> {
            self.calls
                .push(Call::AddFlags(uids.to_vec(), flags.to_vec()));
            Ok(())
        }

        fn remove_flags(&mut self, uids: &[Uid], flags: &[Flag]) -> backend::Result<()> {
            self.calls
                .push(Call::RemoveFlags(uids.to_vec(), flags.to_vec()));
            Ok(())
        }

        fn add_labels(&mut self, uids: &[Uid], labels: &[String]) -> backend::Result<()> {
            self.calls
                .push(Call::AddLabels(uids.to_vec(), labels.to_vec()));
            Ok(())
        }

        fn remove_labels(&mut self, uids: &[Uid], labels: &[String]) -> backend::Result<()> {
            self.calls
                .push(Call::RemoveLabels(uids.to_vec(), labels.to_vec()));
            Ok(())
        }

        fn delete_messages(&mut self, uids: &[Uid]) -> backend::Result<()> {
            self.calls.push(Call::DeleteMessages(uids.to_vec()));
            Ok(())
        }

        fn expunge(&mut self) -> backend::Result<()> {
            self.calls.push(Call::Expunge);
            Ok(())
        }

        fn fetch_envelopes(&mut self, uids: &[Uid]) -> backend::Result<Envelopes> {
            self.calls.push(Call::FetchEnvelopes(uids.to_vec()));
            Ok(self
                .envelopes
                .iter()
                .filter(|envelope| uids.contains(&envelope.uid))
                .cloned()
                .collect())
        }

        fn logout(&mut self) -> backend::Result<()> {
            Ok(())
        }
    }

    fn run(config: &FilterConfig, session: &mut MockSession) -> (Result<()>, String) {
        let mut out = Vec::new();
        let res = BulkFilter::new(config, session, &mut out).run();
        (res, String::from_utf8(out).unwrap())
    }

    #[test_log::test]
    fn add_seen_flag_to_all_inbox_messages() {
        let mut session = MockSession::new(&["INBOX", "Archive"], &[1, 2, 3]);
        let config = FilterConfig {
            flags: vec!["+SEEN".parse().unwrap()],
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert_eq!(
            session.calls,
            vec![
                Call::ListFolders,
                Call::SelectFolder("INBOX".into()),
                Call::SearchAll,
                Call::AddFlags(vec![1, 2, 3], vec![Flag::Seen]),
                Call::RemoveFlags(vec![1, 2, 3], vec![]),
            ],
        );
    }

    #[test]
    fn chunking_is_exhaustive_and_order_preserving() {
        let uids: Vec<Uid> = (1..=250).collect();
        let mut session = MockSession::new(&["INBOX"], &uids);
        let config = FilterConfig {
            trash: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            chunk_size: 100,
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);
        res.unwrap();

        let chunks: Vec<&Vec<Uid>> = session
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::AddLabels(uids, _) => Some(uids),
                _ => None,
            })
            .collect();

        assert_eq!(chunks.len(), 3);
        assert!(chunks[..2].iter().all(|chunk| chunk.len() == 100));
        assert_eq!(chunks[2].len(), 50);

        let rejoined: Vec<Uid> = chunks.into_iter().flatten().copied().collect();
        assert_eq!(rejoined, uids);
    }

    #[test]
    fn fail_if_empty_with_multiple_folders_fails_before_any_session_call() {
        let mut session = MockSession::new(&["A", "B"], &[1]);
        let config = FilterConfig {
            fail_if_empty: true,
            folders: FolderSelection::from_tokens(["A", "B"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        assert!(matches!(res, Err(Error::InvalidOptionsError)));
        assert!(session.calls.is_empty());
    }

    #[test]
    fn fail_if_empty_on_all_folders_fails_after_resolution() {
        let mut session = MockSession::new(&["A", "B"], &[1]);
        let config = FilterConfig {
            fail_if_empty: true,
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        assert!(matches!(res, Err(Error::InvalidOptionsError)));
        assert_eq!(session.calls, vec![Call::ListFolders]);
    }

    #[test_log::test]
    fn fail_if_empty_aborts_without_mutations_on_empty_result() {
        let mut session = MockSession::new(&["INBOX"], &[]);
        let config = FilterConfig {
            fail_if_empty: true,
            trash: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        assert!(matches!(res, Err(Error::NoMatchingMessagesError)));
        assert_eq!(
            session.calls,
            vec![
                Call::ListFolders,
                Call::SelectFolder("INBOX".into()),
                Call::SearchAll,
            ],
        );
    }

    #[test]
    fn empty_search_without_fail_if_empty_is_a_noop() {
        let mut session = MockSession::new(&["INBOX"], &[]);
        let config = FilterConfig {
            delete: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert_eq!(
            session.calls,
            vec![
                Call::ListFolders,
                Call::SelectFolder("INBOX".into()),
                Call::SearchAll,
            ],
        );
    }

    #[test]
    fn show_prints_messages_in_ascending_uid_order() {
        let mut session = MockSession::new(&["INBOX"], &[50, 10]);
        session.envelopes = vec![
            Envelope {
                uid: 50,
                subject: "second".into(),
                ..Default::default()
            },
            Envelope {
                uid: 10,
                subject: "first".into(),
                ..Default::default()
            },
        ];
        let config = FilterConfig {
            show: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, out) = run(&config, &mut session);

        res.unwrap();
        let first = out.find("0010: first").unwrap();
        let second = out.find("0050: second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn delete_expunges_after_each_chunk() {
        let mut session = MockSession::new(&["Spam"], &[1, 2, 3, 4, 5]);
        let config = FilterConfig {
            delete: true,
            folders: FolderSelection::from_tokens(["Spam"]),
            chunk_size: 2,
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert_eq!(
            session.calls[3..],
            [
                Call::DeleteMessages(vec![1, 2]),
                Call::Expunge,
                Call::DeleteMessages(vec![3, 4]),
                Call::Expunge,
                Call::DeleteMessages(vec![5]),
                Call::Expunge,
            ],
        );
    }

    #[test_log::test]
    fn unselectable_folder_is_skipped_without_aborting() {
        let mut session = MockSession::new(&["Bad", "Good"], &[1]);
        session.unselectable = vec!["Bad".into()];
        let config = FilterConfig {
            trash: true,
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert_eq!(
            session.calls,
            vec![
                Call::ListFolders,
                Call::SelectFolder("Bad".into()),
                Call::SelectFolder("Good".into()),
                Call::SearchAll,
                Call::AddLabels(vec![1], vec![label::TRASH.to_string()]),
            ],
        );
    }

    #[test]
    fn query_goes_through_provider_search() {
        let mut session = MockSession::new(&["INBOX"], &[1]);
        let config = FilterConfig {
            query: Some("from:boss".into()),
            show: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert!(session
            .calls
            .contains(&Call::SearchQuery("from:boss".into())));
    }

    #[test]
    fn actions_run_in_fixed_order_per_chunk() {
        let mut session = MockSession::new(&["INBOX"], &[1, 2]);
        let config = FilterConfig {
            flags: vec!["+seen".parse().unwrap(), "-flagged".parse().unwrap()],
            labels: vec![
                LabelSpec::new(Sign::Add, "work"),
                LabelSpec::new(Sign::Remove, "todo"),
            ],
            archive: true,
            show: true,
            trash: true,
            delete: true,
            folders: FolderSelection::from_tokens(["INBOX"]),
            ..Default::default()
        };

        let (res, _) = run(&config, &mut session);

        res.unwrap();
        assert_eq!(
            session.calls[3..],
            [
                Call::AddFlags(vec![1, 2], vec![Flag::Seen]),
                Call::RemoveFlags(vec![1, 2], vec![Flag::Flagged]),
                Call::AddLabels(vec![1, 2], vec!["work".into()]),
                Call::RemoveLabels(vec![1, 2], vec!["todo".into()]),
                Call::RemoveLabels(vec![1, 2], vec![label::INBOX.to_string()]),
                Call::FetchEnvelopes(vec![1, 2]),
                Call::AddLabels(vec![1, 2], vec![label::TRASH.to_string()]),
                Call::DeleteMessages(vec![1, 2]),
                Call::Expunge,
            ],
        );
    }

    #[test]
    fn chunk_range_formats() {
        assert_eq!(chunk_range(&[]), "none");
        assert_eq!(chunk_range(&[7]), "7");
        assert_eq!(chunk_range(&[10, 20, 50]), "10..50");
    }
}
