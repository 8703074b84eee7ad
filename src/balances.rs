use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::types::AccountDesignator;

/// the balance snapshot a computation runs against
///
/// one instance per schedule projection or per single action execution;
/// instances are mutated in place as charges apply and must never be
/// shared across concurrent computations.
pub trait RunningBalances {
    /// current signed balance for the designator (zero when untouched)
    fn balance(&self, designator: AccountDesignator) -> Money;

    /// apply a signed delta to the designator's balance
    fn adjust(&mut self, designator: AccountDesignator, delta: Money);

    fn principal_outstanding(&self) -> Money {
        self.balance(AccountDesignator::CustomerLoanPrincipal)
    }

    fn interest_outstanding(&self) -> Money {
        self.balance(AccountDesignator::CustomerLoanInterest)
    }

    fn fees_outstanding(&self) -> Money {
        self.balance(AccountDesignator::CustomerLoanFees)
    }

    /// principal plus accrued interest and fees
    fn total_outstanding(&self) -> Money {
        self.principal_outstanding() + self.interest_outstanding() + self.fees_outstanding()
    }

    /// credit available on an allowance designator (allowances carry
    /// negative signed balances while funded)
    fn allowance_funded(&self, designator: AccountDesignator) -> Money {
        -self.balance(designator)
    }
}

/// pure in-memory balances for schedule projection and import seeding
#[derive(Debug, Clone, Default)]
pub struct SimulatedRunningBalances {
    balances: BTreeMap<AccountDesignator, Money>,
}

impl SimulatedRunningBalances {
    /// all designators start at zero
    pub fn new() -> Self {
        SimulatedRunningBalances::default()
    }

    /// start from supplied current balances (importing a mid-life loan)
    pub fn seeded(balances: BTreeMap<AccountDesignator, Money>) -> Self {
        SimulatedRunningBalances { balances }
    }

    pub fn snapshot(&self) -> &BTreeMap<AccountDesignator, Money> {
        &self.balances
    }
}

impl RunningBalances for SimulatedRunningBalances {
    fn balance(&self, designator: AccountDesignator) -> Money {
        self.balances
            .get(&designator)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    fn adjust(&mut self, designator: AccountDesignator, delta: Money) {
        let entry = self.balances.entry(designator).or_insert(Money::ZERO);
        *entry += delta;
    }
}

/// the ledger-side account query this core consumes but does not own
pub trait LedgerReader {
    /// current balance of the real account the designator maps to
    fn current_balance(&self, designator: AccountDesignator) -> Money;
}

/// read-through balances backed by the external ledger collaborator
///
/// ledger balances are read lazily; adjustments stay in a local overlay so
/// a computation sees its own uncommitted postings without writing back.
pub struct LedgerRunningBalances<'a, L: LedgerReader> {
    ledger: &'a L,
    overlay: BTreeMap<AccountDesignator, Money>,
}

impl<'a, L: LedgerReader> LedgerRunningBalances<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        LedgerRunningBalances {
            ledger,
            overlay: BTreeMap::new(),
        }
    }
}

impl<'a, L: LedgerReader> RunningBalances for LedgerRunningBalances<'a, L> {
    fn balance(&self, designator: AccountDesignator) -> Money {
        let overlay = self
            .overlay
            .get(&designator)
            .copied()
            .unwrap_or(Money::ZERO);
        self.ledger.current_balance(designator) + overlay
    }

    fn adjust(&mut self, designator: AccountDesignator, delta: Money) {
        let entry = self.overlay.entry(designator).or_insert(Money::ZERO);
        *entry += delta;
    }
}
