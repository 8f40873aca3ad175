//! バッチ単位でアトミックにコミットされるフラットな設定ファイル

use std::collections::{
    BTreeMap,
    BTreeSet,
};
use std::fs::{
    self,
    File,
};
use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Mutex,
    PoisonError,
    RwLock,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::StorageError;

/// 保存される 1 つの値
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    /// 非負整数（バージョン番号など）
    Integer(u64),
    /// 文字列
    Text(String),
    /// 文字列の集合（言語一覧など）
    Set(BTreeSet<String>),
}

/// 1 つの JSON オブジェクトとして永続化されるキー・バリューマップ
///
/// 読み取りはコミット済みスナップショットに対して並行に行われる。
/// 書き込みは [`Preferences::edit`] を通じて直列化され、コピー上で変更を組み立て、
/// 一時ファイルへ書き出してリネームした後にだけ公開される。
/// ファイル I/O の間も読み取りはブロックされない。
/// コミットに失敗した場合、メモリ上の値もディスクも変更されない。
#[derive(Debug)]
pub struct Preferences {
    /// 永続化先ファイル（インメモリの場合は `None`）
    path: Option<PathBuf>,
    /// コミット済みのエントリ
    entries: RwLock<BTreeMap<String, PrefValue>>,
    /// 書き込みを直列化するロック
    writer: Mutex<()>,
}

/// [`Preferences::edit`] のクロージャに渡されるステージング領域
#[derive(Debug)]
pub struct Batch<'a> {
    /// エントリの作業コピー
    entries: &'a mut BTreeMap<String, PrefValue>,
}

impl Batch<'_> {
    /// ステージング中の `key` の値
    /// `key` の値
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.entries.get(key)
    }

    /// ステージング中の文字列集合（存在しない・型が違う場合は空）
    /// 文字列集合を取得（存在しない・型が違う場合は空）
    #[must_use]
    pub fn get_set(&self, key: &str) -> BTreeSet<String> {
        match self.entries.get(key) {
            Some(PrefValue::Set(set)) => set.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// ステージング中の整数
    /// 整数値を取得（他の型の値は `None`）
    #[must_use]
    pub fn get_integer(&self, key: &str) -> Option<u64> {
        match self.entries.get(key) {
            Some(PrefValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// 文字列を書き込む
    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), PrefValue::Text(value.into()));
    }

    /// 整数を書き込む
    pub fn put_integer(&mut self, key: impl Into<String>, value: u64) {
        self.entries.insert(key.into(), PrefValue::Integer(value));
    }

    /// 文字列集合を書き込む
    pub fn put_set(&mut self, key: impl Into<String>, value: BTreeSet<String>) {
        self.entries.insert(key.into(), PrefValue::Set(value));
    }

    /// `key` を削除し、存在していたかを返す
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// 全エントリを削除
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Preferences {
    /// `path` の設定ファイルを開く（存在しなければ空で開始）
    ///
    /// # Errors
    /// - ファイルは存在するが読み込めない
    /// - ファイルが設定値の JSON オブジェクトではない
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = if path.exists() {
            tracing::debug!("Loading preferences from: {:?}", path);
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            tracing::debug!("Preferences file not found, starting empty: {:?}", path);
            BTreeMap::new()
        };

        Ok(Self { path: Some(path), entries: RwLock::new(entries), writer: Mutex::new(()) })
    }

    /// 永続化しないインスタンスを作成
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None, entries: RwLock::new(BTreeMap::new()), writer: Mutex::new(()) }
    }

    /// 永続化先ファイルのパス
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `key` の値
    #[must_use]
    pub fn get(&self, key: &str) -> Option<PrefValue> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// 文字列値を取得（他の型の値は `None`）
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            Some(PrefValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// 整数値を取得（他の型の値は `None`）
    #[must_use]
    pub fn get_integer(&self, key: &str) -> Option<u64> {
        match self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            Some(PrefValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    /// 文字列集合を取得（存在しない・型が違う場合は空）
    #[must_use]
    pub fn get_set(&self, key: &str) -> BTreeSet<String> {
        match self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            Some(PrefValue::Set(set)) => set.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// 保存されているエントリ数
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// エントリが 1 つもない
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// コピー上で `f` を適用し、1 回の永続的な書き込みとしてコミットする
    ///
    /// 書き込み同士は直列化される。読み取り側はコミットが成功するまで
    /// 直前のスナップショットを参照し続け、ファイル I/O の間も待たされない。
    ///
    /// # Errors
    /// - ステージングしたスナップショットのシリアライズまたは書き込みに失敗
    pub fn edit<R>(&self, f: impl FnOnce(&mut Batch<'_>) -> R) -> Result<R, StorageError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut staged = self.entries.read().unwrap_or_else(PoisonError::into_inner).clone();
        let result = f(&mut Batch { entries: &mut staged });

        if let Some(path) = &self.path {
            write_atomic(path, &serde_json::to_string(&staged)?)?;
        }

        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = staged;

        Ok(result)
    }
}

/// `content` を隣の一時ファイルに書き出して同期し、`path` へリネームする
fn write_atomic(path: &Path, content: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}
