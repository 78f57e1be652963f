use num_bigint::BigUint;

use crate::abi::{self, ArgumentValue, ParamType};
use crate::chain::UniversalChainId;
use crate::connection::{
    BlockTag, CallRequest, ReadConnection, TransactionRequest, TxHash, WriteConnection,
};
use crate::error::{AbiError, Error};
use crate::gas_denoms::GasDenomTable;
use crate::token::TokenMeta;

/// A readable ERC-20 field, with the arguments its getter takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erc20Field {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf { owner: [u8; 20] },
    Allowance { owner: [u8; 20], spender: [u8; 20] },
}

impl Erc20Field {
    /// Solidity signature of the getter.
    pub fn signature(&self) -> &'static str {
        match self {
            Erc20Field::Name => "name()",
            Erc20Field::Symbol => "symbol()",
            Erc20Field::Decimals => "decimals()",
            Erc20Field::TotalSupply => "totalSupply()",
            Erc20Field::BalanceOf { .. } => "balanceOf(address)",
            Erc20Field::Allowance { .. } => "allowance(address,address)",
        }
    }

    /// ABI type of the getter's single return value.
    pub fn output(&self) -> ParamType {
        match self {
            Erc20Field::Name | Erc20Field::Symbol => ParamType::String,
            Erc20Field::Decimals => ParamType::Uint(8),
            Erc20Field::TotalSupply
            | Erc20Field::BalanceOf { .. }
            | Erc20Field::Allowance { .. } => ParamType::Uint(256),
        }
    }

    fn args(&self) -> Vec<ArgumentValue> {
        match *self {
            Erc20Field::BalanceOf { owner } => vec![ArgumentValue::Address(owner)],
            Erc20Field::Allowance { owner, spender } => vec![
                ArgumentValue::Address(owner),
                ArgumentValue::Address(spender),
            ],
            _ => vec![],
        }
    }
}

/// Stateless ERC-20 client. The only configuration is the gas-denomination
/// table consulted by [`Erc20Client::read_meta`].
///
/// Every read is a single [`Erc20Client::read_field`] call parameterized by an
/// [`Erc20Field`]; the typed methods only project the decoded value. Connection
/// failures are returned unchanged as [`Error::Connection`].
#[derive(Debug, Clone)]
pub struct Erc20Client {
    gas_denoms: GasDenomTable,
}

impl Default for Erc20Client {
    fn default() -> Self {
        Self::new(GasDenomTable::builtin())
    }
}

impl Erc20Client {
    pub fn new(gas_denoms: GasDenomTable) -> Self {
        Self { gas_denoms }
    }

    pub fn gas_denoms(&self) -> &GasDenomTable {
        &self.gas_denoms
    }

    /// Read one field of the token contract at `token`.
    pub async fn read_field(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        field: Erc20Field,
        block: BlockTag,
    ) -> Result<ArgumentValue, Error> {
        let to = abi::parse_address(token)?;
        let sig = abi::parse_signature(field.signature())?;
        let data = abi::encode_call(&sig, &field.args())?;

        tracing::trace!(target: "erc20", token, call = %sig.canonical, ?block, "contract read");
        let output = conn.call(CallRequest { to, data, block }).await?;

        abi::decode_values(&[field.output()], &output)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AbiError::InvalidEncoding(format!("{} returned nothing", sig.canonical)).into()
            })
    }

    /// Name, symbol and decimals of a token.
    ///
    /// The chain's gas denomination is answered from the static table without
    /// touching the connection; anything else costs three sequential reads.
    pub async fn read_meta(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        chain_id: &UniversalChainId,
    ) -> Result<TokenMeta, Error> {
        if let Some(denom) = self.gas_denoms.lookup(chain_id, token) {
            return Ok(denom.meta());
        }

        let name = self.read_name(conn, token).await?;
        let symbol = self.read_symbol(conn, token).await?;
        let decimals = self.read_decimals(conn, token).await?;
        Ok(TokenMeta {
            name,
            symbol,
            decimals,
        })
    }

    pub async fn read_name(&self, conn: &dyn ReadConnection, token: &str) -> Result<String, Error> {
        let value = self.read_field(conn, token, Erc20Field::Name, BlockTag::Latest).await?;
        expect_string(value)
    }

    pub async fn read_symbol(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
    ) -> Result<String, Error> {
        let value = self.read_field(conn, token, Erc20Field::Symbol, BlockTag::Latest).await?;
        expect_string(value)
    }

    pub async fn read_decimals(&self, conn: &dyn ReadConnection, token: &str) -> Result<u8, Error> {
        let value = self.read_field(conn, token, Erc20Field::Decimals, BlockTag::Latest).await?;
        let n = expect_uint(value)?;
        u8::try_from(&n)
            .map_err(|_| AbiError::InvalidEncoding(format!("decimals out of range: {n}")).into())
    }

    pub async fn read_balance(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        owner: &str,
    ) -> Result<BigUint, Error> {
        self.read_balance_at(conn, token, owner, BlockTag::Latest).await
    }

    pub async fn read_balance_at_block(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        owner: &str,
        block_number: u64,
    ) -> Result<BigUint, Error> {
        self.read_balance_at(conn, token, owner, BlockTag::Number(block_number))
            .await
    }

    async fn read_balance_at(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        owner: &str,
        block: BlockTag,
    ) -> Result<BigUint, Error> {
        let field = Erc20Field::BalanceOf {
            owner: abi::parse_address(owner)?,
        };
        expect_uint(self.read_field(conn, token, field, block).await?)
    }

    pub async fn read_total_supply(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
    ) -> Result<BigUint, Error> {
        let value = self
            .read_field(conn, token, Erc20Field::TotalSupply, BlockTag::Latest)
            .await?;
        expect_uint(value)
    }

    pub async fn read_total_supply_at_block(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        block_number: u64,
    ) -> Result<BigUint, Error> {
        let value = self
            .read_field(conn, token, Erc20Field::TotalSupply, BlockTag::Number(block_number))
            .await?;
        expect_uint(value)
    }

    pub async fn read_allowance(
        &self,
        conn: &dyn ReadConnection,
        token: &str,
        owner: &str,
        spender: &str,
    ) -> Result<BigUint, Error> {
        let field = Erc20Field::Allowance {
            owner: abi::parse_address(owner)?,
            spender: abi::parse_address(spender)?,
        };
        expect_uint(self.read_field(conn, token, field, BlockTag::Latest).await?)
    }

    /// Approve `spender` to move `amount` of `token` on behalf of the
    /// connection's account. Sets the allowance to `amount` via `approve`.
    pub async fn increase_allowance(
        &self,
        conn: &dyn WriteConnection,
        token: &str,
        spender: &str,
        amount: &BigUint,
    ) -> Result<TxHash, Error> {
        let to = abi::parse_address(token)?;
        let spender_addr = abi::parse_address(spender)?;
        let sig = abi::parse_signature("approve(address,uint256)")?;
        let data = abi::encode_call(
            &sig,
            &[ArgumentValue::Address(spender_addr), ArgumentValue::uint(amount)],
        )?;

        tracing::info!(
            target: "erc20",
            token,
            spender,
            account = %format!("0x{}", hex::encode(conn.account())),
            %amount,
            "sending approve"
        );
        Ok(conn.send_transaction(TransactionRequest { to, data }).await?)
    }
}

fn expect_uint(value: ArgumentValue) -> Result<BigUint, Error> {
    value.as_biguint().ok_or_else(|| {
        AbiError::TypeMismatch {
            expected: "uint".to_string(),
            actual: value.kind().to_string(),
        }
        .into()
    })
}

fn expect_string(value: ArgumentValue) -> Result<String, Error> {
    match value {
        ArgumentValue::String(s) => Ok(s),
        other => Err(AbiError::TypeMismatch {
            expected: "string".to_string(),
            actual: other.kind().to_string(),
        }
        .into()),
    }
}
