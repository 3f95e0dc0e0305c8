pub mod mercadopago_gateway;
