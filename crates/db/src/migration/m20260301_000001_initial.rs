//! Initial database migration.
//!
//! Creates the marketplace tables (users, zzp profiles, vacancies,
//! applications, messages)
//! and the credit ledger table (transactions), with the constraints the
//! ledger relies on: a CHECK keeping balances non-negative and a UNIQUE
//! payment-intent reference for idempotent purchase confirmation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: MARKETPLACE
        // ============================================================
        db.execute_unprepared(ZZP_PROFILES_SQL).await?;
        db.execute_unprepared(VACANCIES_SQL).await?;
        db.execute_unprepared(APPLICATIONS_SQL).await?;
        db.execute_unprepared(MESSAGES_SQL).await?;

        // ============================================================
        // PART 4: CREDIT LEDGER
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- User roles
CREATE TYPE user_role AS ENUM ('zzper', 'organisatie');

-- Ledger transaction type
CREATE TYPE transaction_type AS ENUM (
    'credit_purchase',
    'application_credit',
    'subscription_payment'
);

-- Ledger transaction status
CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'failed');

-- Vacancy status
CREATE TYPE vacancy_status AS ENUM ('active', 'closed');

-- Application status
CREATE TYPE application_status AS ENUM ('pending', 'accepted', 'rejected');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    role user_role NOT NULL DEFAULT 'zzper',
    credits INTEGER NOT NULL DEFAULT 0,
    subscription_status VARCHAR(50) NOT NULL DEFAULT 'none',
    stripe_customer_id VARCHAR(255),
    stripe_subscription_id VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- The balance may only change through the ledger operations, which
    -- decrement conditionally; the CHECK is the last line of defence.
    CONSTRAINT chk_credits_non_negative CHECK (credits >= 0)
);

CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_stripe_customer ON users(stripe_customer_id)
    WHERE stripe_customer_id IS NOT NULL;
CREATE INDEX idx_users_stripe_subscription ON users(stripe_subscription_id)
    WHERE stripe_subscription_id IS NOT NULL;
";

const ZZP_PROFILES_SQL: &str = r"
CREATE TABLE zzp_profiles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    bio TEXT,
    specialization VARCHAR(255),
    hourly_rate NUMERIC(12, 2),
    hours_per_week INTEGER,
    location VARCHAR(255),
    available BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_profile_hours_per_week CHECK (hours_per_week IS NULL OR hours_per_week > 0),
    CONSTRAINT chk_profile_hourly_rate CHECK (hourly_rate IS NULL OR hourly_rate >= 0)
);

CREATE INDEX idx_zzp_profiles_created ON zzp_profiles(created_at DESC);
";

const VACANCIES_SQL: &str = r"
CREATE TABLE vacancies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL,
    location VARCHAR(255) NOT NULL,
    hours_per_week INTEGER,
    hourly_rate NUMERIC(12, 2),
    status vacancy_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_hours_per_week CHECK (hours_per_week IS NULL OR hours_per_week > 0),
    CONSTRAINT chk_hourly_rate CHECK (hourly_rate IS NULL OR hourly_rate >= 0)
);

CREATE INDEX idx_vacancies_user ON vacancies(user_id);
CREATE INDEX idx_vacancies_status_created ON vacancies(status, created_at DESC);
";

const APPLICATIONS_SQL: &str = r"
CREATE TABLE applications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    vacancy_id UUID NOT NULL REFERENCES vacancies(id) ON DELETE CASCADE,
    applicant_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    message TEXT,
    status application_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- One application per zzper per vacancy.
    UNIQUE (vacancy_id, applicant_id)
);

CREATE INDEX idx_applications_vacancy ON applications(vacancy_id);
CREATE INDEX idx_applications_applicant ON applications(applicant_id, created_at DESC);
";

const MESSAGES_SQL: &str = r"
CREATE TABLE messages (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    sender_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    receiver_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    is_read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_messages_conversation ON messages(sender_id, receiver_id, created_at);
CREATE INDEX idx_messages_receiver_unread ON messages(receiver_id) WHERE is_read = false;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type transaction_type NOT NULL,
    amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    credits INTEGER NOT NULL,
    -- Idempotency key for purchase confirmation: a payment intent can be
    -- credited at most once.
    stripe_payment_intent_id VARCHAR(255) UNIQUE,
    description TEXT NOT NULL,
    status transaction_status NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transactions_user_created ON transactions(user_id, created_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: set_updated_at
-- Keeps updated_at current on row modification
-- ============================================================
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at := now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
BEFORE UPDATE ON users
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_zzp_profiles_updated_at
BEFORE UPDATE ON zzp_profiles
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_vacancies_updated_at
BEFORE UPDATE ON vacancies
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_applications_updated_at
BEFORE UPDATE ON applications
FOR EACH ROW
EXECUTE FUNCTION set_updated_at();

-- ============================================================
-- FUNCTION: prevent_transaction_mutation
-- The ledger is append-only: rows are never updated. Deletes are
-- allowed only as part of removing the owning user (FK cascade).
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_transaction_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger transactions are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_transactions_append_only
BEFORE UPDATE ON transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_transaction_mutation();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

-- Drop triggers
DROP TRIGGER IF EXISTS trg_transactions_append_only ON transactions;
DROP TRIGGER IF EXISTS trg_applications_updated_at ON applications;
DROP TRIGGER IF EXISTS trg_vacancies_updated_at ON vacancies;
DROP TRIGGER IF EXISTS trg_zzp_profiles_updated_at ON zzp_profiles;
DROP TRIGGER IF EXISTS trg_users_updated_at ON users;

-- Drop functions
DROP FUNCTION IF EXISTS prevent_transaction_mutation();
DROP FUNCTION IF EXISTS set_updated_at();

-- Drop tables (reverse order of creation)
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS messages CASCADE;
DROP TABLE IF EXISTS applications CASCADE;
DROP TABLE IF EXISTS vacancies CASCADE;
DROP TABLE IF EXISTS zzp_profiles CASCADE;
DROP TABLE IF EXISTS users CASCADE;

-- Drop enums
DROP TYPE IF EXISTS application_status CASCADE;
DROP TYPE IF EXISTS vacancy_status CASCADE;
DROP TYPE IF EXISTS transaction_status CASCADE;
DROP TYPE IF EXISTS transaction_type CASCADE;
DROP TYPE IF EXISTS user_role CASCADE;
";
