use crate::bity::client::FiatProvider;
use crate::bity::models::{
    BityError, BityOrder, CurrencyAmount, EstimateRequest, EstimateResponse, OrderInput,
    OrderOutput, OrderOwner, OrderRequest,
};
use crate::entity::{BankInfo, BityTrade, EthInfo, Fees, TradeExact, TradeRequest};
use crate::utils::normalize_iban;

const INPUT_TYPE_CRYPTO: &str = "crypto_address";
const OUTPUT_TYPE_BANK: &str = "bank_account";

fn amount_for(request: &TradeRequest, side: TradeExact) -> Option<String> {
    (request.trade_exact == side).then(|| request.amount.clone())
}

pub fn estimate_request(request: &TradeRequest) -> EstimateRequest {
    EstimateRequest {
        input: CurrencyAmount {
            currency: request.input_currency.symbol.clone(),
            amount: amount_for(request, TradeExact::Input),
        },
        output: CurrencyAmount {
            currency: request.output_currency.symbol.clone(),
            amount: amount_for(request, TradeExact::Output),
        },
    }
}

pub fn order_request(request: &TradeRequest, bank_info: &BankInfo, eth_info: &EthInfo) -> OrderRequest {
    let owner = &bank_info.recipient.owner;
    OrderRequest {
        input: OrderInput {
            currency: request.input_currency.symbol.clone(),
            amount: amount_for(request, TradeExact::Input),
            input_type: INPUT_TYPE_CRYPTO.to_string(),
            crypto_address: Some(eth_info.from_address.clone()),
        },
        output: OrderOutput {
            currency: request.output_currency.symbol.clone(),
            amount: amount_for(request, TradeExact::Output),
            output_type: OUTPUT_TYPE_BANK.to_string(),
            iban: Some(normalize_iban(&bank_info.recipient.iban)),
            bic_swift: bank_info.recipient.bic_swift.clone(),
            reference: bank_info.reference.clone(),
            owner: Some(OrderOwner {
                name: owner.name.clone(),
                address: owner.address.clone(),
                zip: owner.zip.clone(),
                city: owner.city.clone(),
                country: owner.country.clone(),
            }),
        },
    }
}

/// Fee charged by the provider, read from the estimate's price breakdown
pub fn estimate_fees(estimate: &EstimateResponse) -> Option<Fees> {
    let fee = estimate
        .price_breakdown
        .as_ref()?
        .get("customer_trading_fee")?;
    Some(Fees {
        amount: fee.get("amount")?.as_str()?.to_string(),
        currency: fee.get("currency")?.as_str()?.to_string(),
    })
}

/// Quote a fiat trade without placing an order
pub async fn estimate_bity_trade(
    provider: &dyn FiatProvider,
    request: &TradeRequest,
) -> Result<(BityTrade, Option<Fees>), BityError> {
    let estimate = provider.estimate(&estimate_request(request)).await?;
    let fees = estimate_fees(&estimate);
    let trade = BityTrade {
        trade_request: request.clone(),
        input_amount: estimate.input.amount,
        output_amount: estimate.output.amount,
        bity_order_response: None,
    };
    Ok((trade, fees))
}

fn trade_from_order(request: &TradeRequest, order: BityOrder) -> Result<BityTrade, BityError> {
    let input_amount = order
        .input
        .amount
        .clone()
        .ok_or_else(|| BityError::Unexpected("order has no input amount".to_string()))?;
    let output_amount = order
        .output
        .amount
        .clone()
        .ok_or_else(|| BityError::Unexpected("order has no output amount".to_string()))?;

    Ok(BityTrade {
        trade_request: request.clone(),
        input_amount,
        output_amount,
        bity_order_response: Some(order),
    })
}

/// Place a fiat order paying out to `bank_info`, funded from `eth_info`'s address
pub async fn create_bity_trade(
    provider: &dyn FiatProvider,
    request: &TradeRequest,
    bank_info: &BankInfo,
    eth_info: &EthInfo,
) -> Result<BityTrade, BityError> {
    let order = provider
        .create_order(&order_request(request, bank_info, eth_info))
        .await?;
    trade_from_order(request, order)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::bity::models::{BityOrder, OrderInput, OrderOutput, PaymentDetails};
    use crate::entity::{BankInfo, EthInfo, Owner, Recipient};

    pub fn bank_info() -> BankInfo {
        BankInfo {
            recipient: Recipient {
                owner: Owner {
                    name: "Jane Doe".to_string(),
                    address: Some("1 Main Street".to_string()),
                    zip: Some("8001".to_string()),
                    city: Some("Zurich".to_string()),
                    country: Some("CH".to_string()),
                },
                iban: "CH93 0076 2011 6238 5295 7".to_string(),
                bic_swift: None,
                email: None,
            },
            reference: Some("rent".to_string()),
        }
    }

    pub fn eth_info() -> EthInfo {
        EthInfo {
            from_address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            referral_id: Some("ref42".to_string()),
        }
    }

    pub fn order(id: &str, input: &str, output: &str) -> BityOrder {
        BityOrder {
            id: id.to_string(),
            input: OrderInput {
                currency: "ETH".to_string(),
                amount: Some(input.to_string()),
                input_type: "crypto_address".to_string(),
                crypto_address: Some(eth_info().from_address),
            },
            output: OrderOutput {
                currency: "EUR".to_string(),
                amount: Some(output.to_string()),
                output_type: "bank_account".to_string(),
                iban: None,
                bic_swift: None,
                reference: None,
                owner: None,
            },
            payment_details: Some(PaymentDetails {
                crypto_address: "0x000000000000000000000000000000000000dEaD".to_string(),
                payment_type: Some("crypto_address".to_string()),
            }),
            price_breakdown: None,
            message_to_sign: None,
            timestamp_created: None,
            timestamp_awaiting_payment_limit: None,
            timestamp_price_guaranteed: None,
            timestamp_payment_received: None,
            timestamp_executed: None,
            timestamp_cancelled: None,
        }
    }
}
