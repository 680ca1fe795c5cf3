//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use imglens_core::{
    Account, CheckinRecord, PaymentTransaction, ReferralCode, ReferralRecord, SearchLogEntry,
    UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{CheckinOutcome, PaymentOutcome, ReferralOutcome, Store};

/// RocksDB-backed storage implementation.
///
/// Compound operations serialize their read-check-write section behind
/// `write_lock` and commit with a single `WriteBatch`, which makes the
/// conditional debit and the uniqueness-keyed inserts atomic relative to
/// every other store call.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!(path = %path.as_ref().display(), "RocksDB store opened");

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Take the compound-write lock. A poisoned lock is recovered: the data
    /// it guards lives in `RocksDB`, not in the mutex.
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Apply a balance delta and persist the account through `batch`.
    fn stage_balance_update(
        &self,
        batch: &mut WriteBatch,
        account: &mut Account,
        delta: i64,
    ) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        account.credits += delta;
        account.updated_at = chrono::Utc::now();
        let value = Self::serialize(account)?;
        batch.put_cf(&cf, keys::account_key(&account.user_id), value);
        Ok(())
    }

    /// Whether the user has any search log or payment activity.
    /// Used by referral eligibility; called under the write lock.
    fn has_prior_activity(&self, user_id: &UserId) -> Result<bool> {
        let prefix = keys::user_prefix(user_id);
        for cf_name in [cf::SEARCH_LOG, cf::PAYMENTS_BY_USER] {
            let cf = self.cf(cf_name)?;
            let mut iter = self.db.iterator_cf(
                &cf,
                IteratorMode::From(&prefix, rocksdb::Direction::Forward),
            );
            if let Some(item) = iter.next() {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if key.starts_with(&prefix) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let value = Self::serialize(account)?;

        self.db
            .put_cf(&cf, keys::account_key(&account.user_id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>> {
        self.get_raw(cf::ACCOUNTS, &keys::account_key(user_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_or_create_account(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> Result<(Account, bool)> {
        let _guard = self.lock_writes();

        if let Some(mut account) = self.get_account(user_id)? {
            // Refresh a changed email from the identity provider.
            if email.is_some() && account.email.as_deref() != email {
                account.email = email.map(String::from);
                account.updated_at = chrono::Utc::now();
                self.put_account(&account)?;
            }
            return Ok((account, false));
        }

        let account = Account::new(*user_id, email.map(String::from));
        self.put_account(&account)?;
        Ok((account, true))
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn debit(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        let _guard = self.lock_writes();

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        if account.credits < amount {
            return Err(StoreError::InsufficientCredits {
                balance: account.credits,
                required: amount,
            });
        }

        let mut batch = WriteBatch::default();
        self.stage_balance_update(&mut batch, &mut account, -amount)?;
        self.write_batch(batch)?;

        Ok(account.credits)
    }

    fn credit(&self, user_id: &UserId, amount: i64) -> Result<i64> {
        let _guard = self.lock_writes();

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();
        self.stage_balance_update(&mut batch, &mut account, amount)?;
        self.write_batch(batch)?;

        Ok(account.credits)
    }

    // =========================================================================
    // Search Log Operations
    // =========================================================================

    fn record_search(&self, entry: &SearchLogEntry) -> Result<()> {
        let cf = self.cf(cf::SEARCH_LOG)?;
        let key = keys::search_entry_key(&entry.user_id, &entry.id);
        let value = Self::serialize(entry)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_searches(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchLogEntry>> {
        let cf = self.cf(cf::SEARCH_LOG)?;
        let prefix = keys::user_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // ULID keys are time-ordered, so collect forward then reverse for
        // newest-first listing.
        let mut values: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            values.push(value.to_vec());
        }
        values.reverse();

        values
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|data| Self::deserialize(&data))
            .collect()
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    fn apply_payment(&self, payment: &PaymentTransaction) -> Result<PaymentOutcome> {
        let _guard = self.lock_writes();

        // Dedup on the session id: a redelivered webhook is a no-op.
        if self
            .get_raw(cf::PAYMENTS, &keys::payment_key(&payment.session_id))?
            .is_some()
        {
            return Ok(PaymentOutcome::Duplicate);
        }

        let Some(mut account) = self.get_account(&payment.user_id)? else {
            return Ok(PaymentOutcome::AccountMissing);
        };

        let cf_payments = self.cf(cf::PAYMENTS)?;
        let cf_by_user = self.cf(cf::PAYMENTS_BY_USER)?;

        let value = Self::serialize(payment)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_payments, keys::payment_key(&payment.session_id), &value);
        batch.put_cf(
            &cf_by_user,
            keys::user_payment_key(&payment.user_id, &payment.session_id),
            [],
        );
        self.stage_balance_update(&mut batch, &mut account, payment.credits)?;
        self.write_batch(batch)?;

        Ok(PaymentOutcome::Applied {
            balance: account.credits,
        })
    }

    fn get_payment(&self, session_id: &str) -> Result<Option<PaymentTransaction>> {
        self.get_raw(cf::PAYMENTS, &keys::payment_key(session_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    // =========================================================================
    // Reward Operations
    // =========================================================================

    fn claim_checkin(&self, user_id: &UserId, day: &str, reward: i64) -> Result<CheckinOutcome> {
        let _guard = self.lock_writes();

        let key = keys::checkin_key(user_id, day);
        if self.get_raw(cf::CHECKINS, &key)?.is_some() {
            return Ok(CheckinOutcome::Already);
        }

        let mut account = self.get_account(user_id)?.ok_or(StoreError::NotFound)?;

        let cf_checkins = self.cf(cf::CHECKINS)?;
        let record = CheckinRecord::new(*user_id, day.to_string());
        let value = Self::serialize(&record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_checkins, key, value);
        self.stage_balance_update(&mut batch, &mut account, reward)?;
        self.write_batch(batch)?;

        Ok(CheckinOutcome::Claimed {
            balance: account.credits,
        })
    }

    fn has_checkin(&self, user_id: &UserId, day: &str) -> Result<bool> {
        Ok(self
            .get_raw(cf::CHECKINS, &keys::checkin_key(user_id, day))?
            .is_some())
    }

    fn get_or_create_referral_code(&self, user_id: &UserId) -> Result<ReferralCode> {
        let _guard = self.lock_writes();

        if let Some(data) =
            self.get_raw(cf::REFERRAL_CODES_BY_USER, &keys::user_prefix(user_id))?
        {
            return Self::deserialize(&data);
        }

        let cf_codes = self.cf(cf::REFERRAL_CODES)?;
        let cf_by_user = self.cf(cf::REFERRAL_CODES_BY_USER)?;

        // Regenerate on the (unlikely) collision with an existing code.
        let code = loop {
            let candidate = ReferralCode::generate(*user_id);
            if self
                .get_raw(cf::REFERRAL_CODES, &keys::referral_code_key(&candidate.code))?
                .is_none()
            {
                break candidate;
            }
        };

        let value = Self::serialize(&code)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_codes, keys::referral_code_key(&code.code), &value);
        batch.put_cf(&cf_by_user, keys::user_prefix(user_id), &value);
        self.write_batch(batch)?;

        Ok(code)
    }

    fn find_referral_code(&self, code: &str) -> Result<Option<ReferralCode>> {
        self.get_raw(cf::REFERRAL_CODES, &keys::referral_code_key(code))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn claim_referral(
        &self,
        code: &str,
        invitee: &UserId,
        reward: i64,
    ) -> Result<ReferralOutcome> {
        let _guard = self.lock_writes();

        let Some(referral_code) = self.find_referral_code(code)? else {
            return Ok(ReferralOutcome::UnknownCode);
        };

        if referral_code.owner == *invitee {
            return Ok(ReferralOutcome::SelfReferral);
        }

        if self
            .get_raw(cf::REFERRALS, &keys::referral_key(invitee))?
            .is_some()
        {
            return Ok(ReferralOutcome::AlreadyClaimed);
        }

        // The bonus only applies to genuinely new accounts.
        if self.has_prior_activity(invitee)? {
            return Ok(ReferralOutcome::NotEligible);
        }

        let mut inviter_account = self
            .get_account(&referral_code.owner)?
            .ok_or(StoreError::NotFound)?;

        let record = ReferralRecord {
            invitee: *invitee,
            inviter: referral_code.owner,
            code: code.to_string(),
            reward,
            created_at: chrono::Utc::now(),
        };

        let cf_referrals = self.cf(cf::REFERRALS)?;
        let value = Self::serialize(&record)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_referrals, keys::referral_key(invitee), value);
        self.stage_balance_update(&mut batch, &mut inviter_account, reward)?;
        self.write_batch(batch)?;

        Ok(ReferralOutcome::Claimed {
            inviter: referral_code.owner,
            inviter_balance: inviter_account.credits,
        })
    }

    fn get_referral(&self, invitee: &UserId) -> Result<Option<ReferralRecord>> {
        self.get_raw(cf::REFERRALS, &keys::referral_key(invitee))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}
